//! Wire Types
//!
//! Camel-cased JSON payloads of the cart service, shared by the HTTP server and the
//! client-side store. Money travels as integer minor units of the cart currency and
//! percentages as points (`10.0` is 10%).

use decimal_percentage::Percentage;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tiercart::{
    cart::CartError,
    items::LineItemError,
    pricing::{percent_from_points, percent_points},
};

mod cart;
mod checkout;

pub use cart::*;
pub use checkout::*;

/// Response envelope: `{ success, data }` or `{ success: false, error }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// The payload, or the error message for failures and empty successes.
    ///
    /// # Errors
    ///
    /// Returns the envelope's error message.
    pub fn into_result(self) -> Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err("response carried no data".to_string()),
            (false, _) => Err(self
                .error
                .unwrap_or_else(|| "request failed".to_string())),
        }
    }
}

/// Errors turning payloads into engine values.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("unknown currency: {0}")]
    UnknownCurrency(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid percentage: {0}")]
    InvalidPercentage(f64),

    #[error(transparent)]
    Line(#[from] LineItemError),

    #[error(transparent)]
    Cart(#[from] CartError),
}

pub(crate) fn points(percent: &Percentage) -> f64 {
    percent_points(percent).to_f64().unwrap_or_default()
}

pub(crate) fn percent(points: f64) -> Result<Percentage, WireError> {
    if !points.is_finite() || !(0.0..=100.0).contains(&points) {
        return Err(WireError::InvalidPercentage(points));
    }

    Ok(percent_from_points(points))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn failures_serialize_without_data() -> TestResult {
        let envelope: Envelope<()> = Envelope::error("missing required field: city");

        assert_eq!(
            serde_json::to_value(&envelope)?,
            json!({ "success": false, "error": "missing required field: city" })
        );

        Ok(())
    }

    #[test]
    fn into_result_surfaces_the_error_message() -> TestResult {
        let envelope: Envelope<u32> =
            serde_json::from_value(json!({ "success": false, "error": "cart item not found" }))?;

        assert_eq!(envelope.into_result(), Err("cart item not found".to_string()));

        Ok(())
    }
}
