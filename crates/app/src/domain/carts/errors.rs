//! Carts service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use tiercart::cart::CartError;

#[derive(Debug, Error)]
pub enum CartsServiceError {
    #[error("cart item not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("cart was modified concurrently: {0}")]
    Conflict(String),

    #[error("stored cart data is invalid: {0}")]
    InvalidData(String),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for CartsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::Conflict("duplicate cart record".to_string()),
            Some(ErrorKind::ForeignKeyViolation) => {
                Self::InvalidData("related resource not found".to_string())
            }
            Some(ErrorKind::NotNullViolation) => {
                Self::InvalidData("missing required data".to_string())
            }
            Some(ErrorKind::CheckViolation) => Self::Validation("invalid cart data".to_string()),
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}

impl From<CartError> for CartsServiceError {
    fn from(error: CartError) -> Self {
        match error {
            CartError::ItemNotFound(_) => Self::NotFound,
            CartError::VersionConflict { .. } => Self::Conflict(error.to_string()),
            CartError::Item(_) | CartError::CurrencyMismatch(..) | CartError::Pricing(_) => {
                Self::Validation(error.to_string())
            }
        }
    }
}
