//! Catalog fixtures
//!
//! Products described in YAML (or JSON from an upstream catalog) with prices written as
//! `"AMOUNT CURRENCY"` and percentages as `"15%"` or `"0.15"`.

use std::{fs, path::Path};

use async_trait::async_trait;
use decimal_percentage::Percentage;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use rustc_hash::FxHashMap;
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use serde::{Deserialize, Serialize};

use tiercart::{
    items::BulkDiscount,
    tiers::{PriceSchedule, PriceTier, ProductPricing},
    uuids::{ProductUuid, SupplierUuid},
    variations::{VariationAttribute, VariationCombination},
};

use crate::domain::catalog::{
    errors::CatalogError, models::CatalogProduct, service::ProductCatalog,
};

/// Wrapper for products in YAML
#[derive(Debug, Deserialize)]
pub struct ProductsFixture {
    /// Map of product uuid -> product fixture
    pub products: FxHashMap<ProductUuid, ProductFixture>,
}

/// Product Fixture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductFixture {
    pub name: String,

    #[serde(default)]
    pub image: Option<String>,

    pub supplier: SupplierUuid,

    pub supplier_name: String,

    /// List price (e.g., "120 PKR")
    pub price: String,

    #[serde(default)]
    pub compare_at_price: Option<String>,

    #[serde(default)]
    pub tiers: Vec<TierFixture>,

    #[serde(default)]
    pub combinations: Vec<CombinationFixture>,

    #[serde(default)]
    pub min_order_quantity: Option<u32>,

    #[serde(default)]
    pub max_order_quantity: Option<u32>,

    #[serde(default)]
    pub bulk_discounts: Vec<BulkDiscountFixture>,

    #[serde(default)]
    pub stock: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierFixture {
    pub min_qty: u32,

    #[serde(default)]
    pub max_qty: Option<u32>,

    pub price: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinationFixture {
    pub id: String,

    pub attributes: Vec<AttributeFixture>,

    pub price: String,

    #[serde(default)]
    pub stock: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeFixture {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkDiscountFixture {
    pub min_qty: u32,

    /// Discount (e.g., "5%")
    pub discount: String,
}

fn money(s: &str) -> Result<Money<'static, Currency>, CatalogError> {
    let (minor_units, currency) = parse_price(s)?;

    Ok(Money::from_minor(minor_units, currency))
}

impl ProductFixture {
    /// Convert into a catalog product.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if a price, percentage or tier schedule is invalid.
    pub fn into_product(self, uuid: ProductUuid) -> Result<CatalogProduct, CatalogError> {
        let base_price = money(&self.price)?;

        let schedule = PriceSchedule::new(
            self.tiers
                .iter()
                .map(|tier| Ok(PriceTier::new(tier.min_qty, tier.max_qty, money(&tier.price)?)))
                .collect::<Result<Vec<_>, CatalogError>>()?,
        )?;

        let combinations = self
            .combinations
            .into_iter()
            .map(|combination| {
                Ok(VariationCombination {
                    price: money(&combination.price)?,
                    id: combination.id,
                    attributes: combination
                        .attributes
                        .into_iter()
                        .map(|attribute| VariationAttribute::new(attribute.name, attribute.value))
                        .collect(),
                    stock: combination.stock,
                })
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;

        let bulk_discounts = self
            .bulk_discounts
            .iter()
            .map(|discount| {
                Ok(BulkDiscount {
                    min_qty: discount.min_qty,
                    discount: parse_percentage(&discount.discount)?,
                })
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;

        Ok(CatalogProduct {
            uuid,
            name: self.name,
            image: self.image,
            supplier: self.supplier,
            supplier_name: self.supplier_name,
            pricing: ProductPricing {
                base_price,
                schedule,
                combinations,
            },
            compare_at_price: self.compare_at_price.as_deref().map(money).transpose()?,
            min_order_quantity: self.min_order_quantity,
            max_order_quantity: self.max_order_quantity,
            bulk_discounts,
            stock: self.stock,
        })
    }
}

/// Parse price string (e.g., "2.99 GBP") into minor units and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount cannot be parsed, or if the currency code is not an ISO code.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), CatalogError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    let [amount, code] = parts.as_slice() else {
        return Err(CatalogError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| CatalogError::InvalidPrice(s.to_string()))?;

    let currency = iso::find(code).ok_or_else(|| CatalogError::UnknownCurrency((*code).to_string()))?;

    let minor_units = 10_i64
        .checked_pow(currency.exponent)
        .and_then(|scale| amount.checked_mul(Decimal::from(scale)))
        .and_then(|value| value.round_dp(0).to_i64())
        .ok_or_else(|| CatalogError::InvalidPrice(s.to_string()))?;

    if minor_units < 0 {
        return Err(CatalogError::InvalidPrice(s.to_string()));
    }

    Ok((minor_units, currency))
}

/// Parse percentage string (e.g., "15%" or "0.15") into a `Percentage`
///
/// # Errors
///
/// Returns an error if the string cannot be parsed or lies outside 0% to 100%.
pub fn parse_percentage(s: &str) -> Result<Percentage, CatalogError> {
    let trimmed = s.trim();

    let value = if let Some(percent_str) = trimmed.strip_suffix('%') {
        percent_str
            .trim()
            .parse::<Decimal>()
            .map_err(|_err| CatalogError::InvalidPercentage(s.to_string()))?
            / Decimal::ONE_HUNDRED
    } else {
        trimmed
            .parse::<Decimal>()
            .map_err(|_err| CatalogError::InvalidPercentage(s.to_string()))?
    };

    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(CatalogError::InvalidPercentage(s.to_string()));
    }

    Ok(Percentage::from(value))
}

/// A catalog held in memory, loaded from fixtures.
#[derive(Debug, Clone, Default)]
pub struct FixtureCatalog {
    products: FxHashMap<ProductUuid, CatalogProduct>,
}

impl FixtureCatalog {
    /// Parse a catalog from YAML.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] when the YAML is malformed or a product is invalid.
    pub fn from_yaml_str(contents: &str) -> Result<Self, CatalogError> {
        let fixture: ProductsFixture = serde_norway::from_str(contents)?;
        let mut catalog = Self::default();

        for (uuid, product) in fixture.products {
            catalog.insert(product.into_product(uuid)?);
        }

        Ok(catalog)
    }

    /// Load a catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] when the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml_str(&contents)
    }

    pub fn insert(&mut self, product: CatalogProduct) {
        self.products.insert(product.uuid, product);
    }

    pub fn product(&self, uuid: ProductUuid) -> Option<&CatalogProduct> {
        self.products.get(&uuid)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[async_trait]
impl ProductCatalog for FixtureCatalog {
    async fn get_product(&self, product: ProductUuid) -> Result<CatalogProduct, CatalogError> {
        self.product(product)
            .cloned()
            .ok_or(CatalogError::NotFound(product))
    }
}
