//! Product catalog boundary.

use async_trait::async_trait;
use mockall::automock;

use tiercart::uuids::ProductUuid;

use crate::domain::catalog::{errors::CatalogError, models::CatalogProduct};

#[automock]
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Fetch a product's pricing data.
    async fn get_product(&self, product: ProductUuid) -> Result<CatalogProduct, CatalogError>;
}
