//! Errors

use tracing::error;

use tiercart::checkout::CheckoutError;
use tiercart_app::domain::checkout::{CheckoutServiceError, OrdersError};

use crate::{carts::errors as carts, responses::ApiError};

pub(crate) fn into_api_error(error: CheckoutServiceError) -> ApiError {
    match error {
        CheckoutServiceError::Validation(_) | CheckoutServiceError::EmptyCart => {
            ApiError::bad_request(error.to_string())
        }
        CheckoutServiceError::Totals(totals) => totals_error(totals),
        CheckoutServiceError::Carts(source) => carts::into_api_error(source),
        CheckoutServiceError::Catalog(source) => carts::catalog_error(source),
        CheckoutServiceError::Orders(source) => orders_error(source),
    }
}

fn totals_error(error: CheckoutError) -> ApiError {
    match error {
        CheckoutError::PromoNotSupported(_) | CheckoutError::UnknownPromoCode(_) => {
            ApiError::bad_request(error.to_string())
        }
        CheckoutError::CurrencyMismatch(..) | CheckoutError::Pricing(_) => {
            error!("failed to calculate totals: {error}");

            ApiError::internal()
        }
    }
}

fn orders_error(error: OrdersError) -> ApiError {
    match error {
        OrdersError::Timeout => ApiError::gateway_timeout(error.to_string()),
        OrdersError::Http(_) | OrdersError::Rejected(_) => {
            error!("order service failed: {error}");

            ApiError::bad_gateway("order service unavailable")
        }
    }
}
