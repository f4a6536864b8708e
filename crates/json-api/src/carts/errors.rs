//! Errors

use tracing::error;

use tiercart_app::{
    domain::{
        carts::CartsServiceError,
        catalog::{CatalogError, intake::IntakeError},
    },
    wire::WireError,
};

use crate::responses::ApiError;

pub(crate) fn into_api_error(error: CartsServiceError) -> ApiError {
    match error {
        CartsServiceError::NotFound => ApiError::not_found(error.to_string()),
        CartsServiceError::Validation(message) => ApiError::bad_request(message),
        CartsServiceError::Conflict(_) => ApiError::conflict(error.to_string()),
        CartsServiceError::InvalidData(message) => {
            error!("stored cart is invalid: {message}");

            ApiError::internal()
        }
        CartsServiceError::Sql(source) => {
            error!("cart storage failed: {source}");

            ApiError::internal()
        }
    }
}

pub(crate) fn catalog_error(error: CatalogError) -> ApiError {
    match error {
        CatalogError::NotFound(_) => ApiError::not_found(error.to_string()),
        CatalogError::Timeout => ApiError::gateway_timeout(error.to_string()),
        other => {
            error!("catalog lookup failed: {other}");

            ApiError::bad_gateway("catalog service unavailable")
        }
    }
}

pub(crate) fn intake_error(error: IntakeError) -> ApiError {
    match error {
        IntakeError::Catalog(source) => catalog_error(source),
        IntakeError::InvalidQuantity(_)
        | IntakeError::OutOfStock { .. }
        | IntakeError::InvalidDiscount
        | IntakeError::NegativeQuote
        | IntakeError::Pricing(_) => ApiError::bad_request(error.to_string()),
    }
}

pub(crate) fn payload_error(error: &WireError) -> ApiError {
    ApiError::bad_request(error.to_string())
}
