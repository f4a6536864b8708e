//! Checkout service errors.

use thiserror::Error;

use tiercart::{checkout::CheckoutError, orders::OrderValidationError, pricing::PricingError};

use crate::domain::{
    carts::CartsServiceError, catalog::CatalogError, checkout::orders::OrdersError,
};

#[derive(Debug, Error)]
pub enum CheckoutServiceError {
    #[error(transparent)]
    Validation(#[from] OrderValidationError),

    #[error("cart is empty")]
    EmptyCart,

    #[error(transparent)]
    Totals(#[from] CheckoutError),

    #[error(transparent)]
    Carts(#[from] CartsServiceError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("no order could be created: {0}")]
    Orders(#[source] OrdersError),
}

impl From<PricingError> for CheckoutServiceError {
    fn from(error: PricingError) -> Self {
        Self::Totals(CheckoutError::Pricing(error))
    }
}
