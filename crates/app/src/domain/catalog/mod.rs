//! Catalog

pub mod errors;
pub mod fixtures;
pub mod http;
pub mod intake;
pub mod models;
pub mod service;

pub use errors::CatalogError;
pub use fixtures::FixtureCatalog;
pub use http::HttpProductCatalog;
pub use models::CatalogProduct;
pub use service::*;
