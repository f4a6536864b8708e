//! Upstream catalog over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use tiercart::uuids::ProductUuid;

use crate::domain::catalog::{
    errors::CatalogError, fixtures::ProductFixture, models::CatalogProduct,
    service::ProductCatalog,
};

/// Reads products from `{base_url}/products/{uuid}`, which answers with a product
/// fixture document in JSON.
#[derive(Debug, Clone)]
pub struct HttpProductCatalog {
    base_url: String,
    http: Client,
}

impl HttpProductCatalog {
    /// Create a client whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CatalogError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }
}

#[async_trait]
impl ProductCatalog for HttpProductCatalog {
    async fn get_product(&self, product: ProductUuid) -> Result<CatalogProduct, CatalogError> {
        let url = format!("{}/products/{product}", self.base_url);

        debug!(%url, "fetching catalog product");

        let response = self.http.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(product));
        }

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(CatalogError::UnexpectedResponse(format!(
                "product request failed with status {status}: {text}"
            )));
        }

        let fixture: ProductFixture = response.json().await?;

        fixture.into_product(product)
    }
}
