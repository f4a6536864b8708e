//! Checkout payloads.

use serde::{Deserialize, Serialize};

use tiercart::{
    checkout::{CheckoutFlow, CheckoutTotals},
    orders::CheckoutRequest,
};

use crate::domain::checkout::{CheckoutOutcome, CreatedOrder};

/// `POST /checkout` body.
pub type CheckoutPayload = CheckoutRequest;

/// `GET /cart/totals` data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsPayload {
    pub flow: String,
    pub currency: String,
    pub subtotal: i64,
    pub savings: i64,
    pub shipping: i64,
    pub promo_discount: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promo_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax: Option<i64>,

    pub total: i64,
    pub total_quantity: u64,
}

impl TotalsPayload {
    pub fn from_totals(totals: &CheckoutTotals<'_>) -> Self {
        Self {
            flow: totals.flow.as_str().to_string(),
            currency: totals.total.currency().iso_alpha_code.to_string(),
            subtotal: totals.subtotal.to_minor_units(),
            savings: totals.savings.to_minor_units(),
            shipping: totals.shipping.to_minor_units(),
            promo_discount: totals.promo_discount.to_minor_units(),
            promo_code: totals.promo_code.clone(),
            tax: totals.tax.map(|tax| tax.to_minor_units()),
            total: totals.total.to_minor_units(),
            total_quantity: totals.total_quantity,
        }
    }

    /// The flow these totals were computed for, when it is one this build knows.
    pub fn checkout_flow(&self) -> Option<CheckoutFlow> {
        self.flow.parse().ok()
    }
}

/// `POST /checkout` data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResultPayload {
    pub orders: Vec<CreatedOrder>,
    pub totals: TotalsPayload,

    /// Supplier orders that failed after the cart was cleared
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl CheckoutResultPayload {
    pub fn from_outcome(outcome: &CheckoutOutcome) -> Self {
        Self {
            orders: outcome.orders.clone(),
            totals: TotalsPayload::from_totals(&outcome.totals),
            warnings: outcome.warnings.iter().map(ToString::to_string).collect(),
        }
    }
}
