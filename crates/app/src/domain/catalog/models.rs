//! Catalog models.

use rusty_money::{Money, iso::Currency};

use tiercart::{
    items::BulkDiscount,
    tiers::ProductPricing,
    uuids::{ProductUuid, SupplierUuid},
};

/// The fields of a catalog product that cart pricing consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogProduct {
    pub uuid: ProductUuid,
    pub name: String,
    pub image: Option<String>,
    pub supplier: SupplierUuid,
    pub supplier_name: String,
    pub pricing: ProductPricing<'static>,

    /// List price shown struck through, when the supplier sets one
    pub compare_at_price: Option<Money<'static, Currency>>,

    pub min_order_quantity: Option<u32>,
    pub max_order_quantity: Option<u32>,
    pub bulk_discounts: Vec<BulkDiscount>,

    /// Units in stock for the base product, when tracked
    pub stock: Option<u32>,
}

impl CatalogProduct {
    /// Catalog currency, taken from the list price.
    pub fn currency(&self) -> &'static Currency {
        self.pricing.base_price.currency()
    }
}
