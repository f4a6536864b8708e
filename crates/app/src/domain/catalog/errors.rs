//! Catalog errors.

use thiserror::Error;

use tiercart::{tiers::TierError, uuids::ProductUuid};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("product {0} not found")]
    NotFound(ProductUuid),

    #[error("invalid price: {0}")]
    InvalidPrice(String),

    #[error("unknown currency: {0}")]
    UnknownCurrency(String),

    #[error("invalid percentage: {0}")]
    InvalidPercentage(String),

    #[error("invalid price tiers: {0}")]
    Tiers(#[from] TierError),

    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    #[error("catalog request timed out")]
    Timeout,

    #[error("catalog http error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("unexpected response from catalog: {0}")]
    UnexpectedResponse(String),
}

impl From<reqwest::Error> for CatalogError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(error)
        }
    }
}
