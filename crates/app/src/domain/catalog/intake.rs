//! Cart intake
//!
//! Normalizes an add-to-cart request into a canonical [`NewLineItem`], priced from the
//! catalog. Nothing downstream reads request fields directly.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use tiercart::{
    items::{LineItemDetails, LineItemKind, NegotiatedItem, NewLineItem, StandardItem},
    pricing::PricingError,
    uuids::{ProductUuid, RequestUuid},
    variations::VariationAttribute,
};

use crate::domain::catalog::{
    errors::CatalogError, models::CatalogProduct, service::ProductCatalog,
};

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("quantity must be at least 1, got {0}")]
    InvalidQuantity(i64),

    #[error("quantity {requested} exceeds the {available} units in stock")]
    OutOfStock { requested: u32, available: u32 },

    #[error("discount must be between 0% and 100%")]
    InvalidDiscount,

    #[error("quoted price must not be negative")]
    NegativeQuote,

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Variation selected for a catalog line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub variant_id: Option<String>,
    pub variant_name: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub material: Option<String>,
    pub style: Option<String>,
    pub attributes: Vec<VariationAttribute>,
}

/// Terms of a supplier's answer to a custom request.
#[derive(Debug, Clone, PartialEq)]
pub struct BidTerms {
    pub request: RequestUuid,

    /// Quoted unit price in the catalog currency's minor units
    pub original_price: i64,

    pub discount: Percentage,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AddItemKind {
    Regular(Selection),
    Bid(BidTerms),
}

/// An add-to-cart request.
#[derive(Debug, Clone, PartialEq)]
pub struct AddItem {
    pub product: ProductUuid,
    pub quantity: i64,
    pub is_bulk_order: bool,
    pub kind: AddItemKind,
}

fn details(product: &CatalogProduct, is_bulk_order: bool) -> LineItemDetails {
    let mut details = LineItemDetails::new(
        product.uuid,
        product.name.clone(),
        product.supplier,
        product.supplier_name.clone(),
    );

    details.product_image.clone_from(&product.image);
    details.is_bulk_order = is_bulk_order;
    details.min_order_quantity = product.min_order_quantity;
    details.max_order_quantity = product.max_order_quantity;
    details.bulk_discounts.clone_from(&product.bulk_discounts);

    details
}

fn standard_line(
    product: &CatalogProduct,
    selection: Selection,
    quantity: u32,
) -> Result<(LineItemKind<'static>, Money<'static, Currency>), IntakeError> {
    let standard = StandardItem {
        variant_id: selection.variant_id,
        variant_name: selection.variant_name,
        color: selection.color,
        size: selection.size,
        material: selection.material,
        style: selection.style,
        attributes: selection.attributes,
        compare_at_price: None,
    };

    let key = standard.variation_key();
    let combination = product.pricing.combination(&key);

    let stock = combination.map_or(product.stock, |combination| combination.stock);

    if let Some(available) = stock.filter(|available| quantity > *available) {
        return Err(IntakeError::OutOfStock {
            requested: quantity,
            available,
        });
    }

    let unit_price = product.pricing.unit_price_for(&key, quantity);

    let list_price = product.compare_at_price.unwrap_or_else(|| {
        combination.map_or(product.pricing.base_price, |combination| combination.price)
    });

    let compare_at_price = (list_price.to_minor_units() > unit_price.to_minor_units())
        .then_some(list_price);

    Ok((
        LineItemKind::Standard(StandardItem {
            compare_at_price,
            ..standard
        }),
        unit_price,
    ))
}

fn negotiated_line(
    product: &CatalogProduct,
    bid: BidTerms,
) -> Result<(LineItemKind<'static>, Money<'static, Currency>), IntakeError> {
    let points = bid.discount * Decimal::ONE;

    if points < Decimal::ZERO || points > Decimal::ONE {
        return Err(IntakeError::InvalidDiscount);
    }

    if bid.original_price < 0 {
        return Err(IntakeError::NegativeQuote);
    }

    let negotiated = NegotiatedItem {
        request: bid.request,
        original_price: Money::from_minor(bid.original_price, product.currency()),
        discount: bid.discount,
    };

    let unit_price = negotiated.negotiated_price()?;

    Ok((LineItemKind::Negotiated(negotiated), unit_price))
}

/// Build the canonical line for an add request.
///
/// Regular lines are priced through the product's tier schedule, combinations and list
/// price at the requested quantity. Bid lines are priced at the quote less the discount.
///
/// # Errors
///
/// Returns an [`IntakeError`] for invalid quantities or discounts, insufficient stock, or
/// when the catalog cannot supply the product.
pub async fn build_line_item(
    catalog: &dyn ProductCatalog,
    item: AddItem,
) -> Result<NewLineItem<'static>, IntakeError> {
    let quantity = u32::try_from(item.quantity)
        .ok()
        .filter(|quantity| *quantity > 0)
        .ok_or(IntakeError::InvalidQuantity(item.quantity))?;

    let product = catalog.get_product(item.product).await?;

    let (kind, unit_price) = match item.kind {
        AddItemKind::Regular(selection) => standard_line(&product, selection, quantity)?,
        AddItemKind::Bid(bid) => negotiated_line(&product, bid)?,
    };

    Ok(NewLineItem {
        details: details(&product, item.is_bulk_order),
        kind,
        quantity,
        unit_price,
    })
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::PKR;
    use testresult::TestResult;
    use tiercart::pricing::percent_from_basis_points;

    use crate::domain::catalog::{
        fixtures::{
            FixtureCatalog,
            tests::{CATALOG, TEE},
        },
        service::MockProductCatalog,
    };

    use super::*;

    fn regular(product: ProductUuid, quantity: i64, selection: Selection) -> AddItem {
        AddItem {
            product,
            quantity,
            is_bulk_order: false,
            kind: AddItemKind::Regular(selection),
        }
    }

    #[tokio::test]
    async fn regular_lines_are_tier_priced_at_the_requested_quantity() -> TestResult {
        let catalog = FixtureCatalog::from_yaml_str(CATALOG)?;

        let line = build_line_item(&catalog, regular(TEE.parse()?, 50, Selection::default())).await?;

        assert_eq!(line.unit_price, Money::from_minor(10_000, PKR));
        assert_eq!(line.details.product_name, "Cotton Tee");
        assert_eq!(line.details.min_order_quantity, Some(12));

        let LineItemKind::Standard(standard) = line.kind else {
            return Err("expected a standard line".into());
        };

        assert_eq!(standard.compare_at_price, Some(Money::from_minor(12_000, PKR)));

        Ok(())
    }

    #[tokio::test]
    async fn combination_stock_is_enforced() -> TestResult {
        let catalog = FixtureCatalog::from_yaml_str(CATALOG)?;

        let selection = Selection {
            color: Some("Red".to_string()),
            size: Some("M".to_string()),
            ..Selection::default()
        };

        let result = build_line_item(&catalog, regular(TEE.parse()?, 41, selection)).await;

        assert!(matches!(
            result,
            Err(IntakeError::OutOfStock {
                requested: 41,
                available: 40
            })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn bids_take_the_quote_less_the_discount() -> TestResult {
        let catalog = FixtureCatalog::from_yaml_str(CATALOG)?;
        let request = RequestUuid::new();

        let line = build_line_item(
            &catalog,
            AddItem {
                product: TEE.parse()?,
                quantity: 300,
                is_bulk_order: true,
                kind: AddItemKind::Bid(BidTerms {
                    request,
                    original_price: 9_000,
                    discount: percent_from_basis_points(1_000),
                }),
            },
        )
        .await?;

        assert_eq!(line.unit_price, Money::from_minor(8_100, PKR));
        assert!(line.details.is_bulk_order);
        assert!(matches!(
            line.kind,
            LineItemKind::Negotiated(NegotiatedItem { request: r, .. }) if r == request
        ));

        Ok(())
    }

    #[tokio::test]
    async fn invalid_quantities_never_reach_the_catalog() -> TestResult {
        let mut catalog = MockProductCatalog::new();
        catalog.expect_get_product().never();

        let result = build_line_item(&catalog, regular(ProductUuid::new(), 0, Selection::default())).await;

        assert!(matches!(result, Err(IntakeError::InvalidQuantity(0))));

        Ok(())
    }

    #[tokio::test]
    async fn catalog_failures_are_propagated() -> TestResult {
        let product = ProductUuid::new();
        let mut catalog = MockProductCatalog::new();

        catalog
            .expect_get_product()
            .once()
            .withf(move |uuid| *uuid == product)
            .return_once(|_| Err(CatalogError::Timeout));

        let result = build_line_item(&catalog, regular(product, 3, Selection::default())).await;

        assert!(matches!(
            result,
            Err(IntakeError::Catalog(CatalogError::Timeout))
        ));

        Ok(())
    }
}
