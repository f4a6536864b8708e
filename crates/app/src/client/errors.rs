//! Client errors.

use thiserror::Error;

use tiercart::{checkout::CheckoutError, orders::OrderValidationError, pricing::PricingError};

use crate::wire::WireError;

/// Failures talking to the cart service. A timeout is reported on its own and is never
/// folded into a network or server error.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("cart service timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("cart service error ({status}): {message}")]
    Server { status: u16, message: String },
}

impl From<reqwest::Error> for GatewayError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(error)
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("quantity must be at least 1, got {0}")]
    InvalidQuantity(i64),

    #[error("invalid item: {0}")]
    InvalidItem(#[source] WireError),

    #[error(transparent)]
    InvalidOrder(#[from] OrderValidationError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("invalid cart snapshot: {0}")]
    InvalidResponse(#[source] WireError),

    #[error(transparent)]
    Totals(#[from] CheckoutError),

    #[error(transparent)]
    Pricing(#[from] PricingError),
}

impl ClientError {
    /// Returns `true` for failures caught before any request was sent.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidQuantity(_) | Self::InvalidItem(_) | Self::InvalidOrder(_)
        )
    }
}
