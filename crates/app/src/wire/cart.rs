//! Cart payloads.

use jiff::Timestamp;
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use serde::{Deserialize, Serialize};

use tiercart::{
    cart::Cart,
    groups::CartGroup,
    items::{
        BulkDiscount, LineItem, LineItemDetails, LineItemKind, NegotiatedItem, NewLineItem,
        StandardItem,
    },
    pricing::PricingError,
    uuids::{BuyerUuid, CartUuid, LineItemUuid, ProductUuid, RequestUuid, SupplierUuid},
    variations::VariationAttribute,
};

use crate::{
    domain::catalog::intake::{AddItem, AddItemKind, BidTerms, Selection},
    wire::{WireError, percent, points},
};

/// Line kind as it appears on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineType {
    #[default]
    Regular,
    Bid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributePayload {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDiscountPayload {
    pub min_qty: u32,
    pub discount_percent: f64,
}

impl From<&BulkDiscount> for BulkDiscountPayload {
    fn from(discount: &BulkDiscount) -> Self {
        Self {
            min_qty: discount.min_qty,
            discount_percent: points(&discount.discount),
        }
    }
}

/// `GET /cart` data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartPayload {
    pub cart_id: CartUuid,
    pub buyer_id: BuyerUuid,
    pub currency: String,
    pub items: Vec<CartLinePayload>,
    pub total_items: u64,
    pub total_amount: i64,
    pub version: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One cart line, flattened over both kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLinePayload {
    pub id: LineItemUuid,

    #[serde(rename = "type")]
    pub line_type: LineType,

    pub product_id: ProductUuid,
    pub product_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_image: Option<String>,

    pub supplier_id: SupplierUuid,
    pub supplier_name: String,
    pub quantity: u32,
    pub unit_price: i64,
    pub total_price: i64,
    pub added_at: Timestamp,

    #[serde(default)]
    pub is_bulk_order: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_order_quantity: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_order_quantity: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bulk_discounts: Vec<BulkDiscountPayload>,

    /// Deepest bulk discount the current quantity reaches. Output only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlocked_bulk_discount: Option<BulkDiscountPayload>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variation_attributes: Vec<AttributePayload>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_at_price: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestUuid>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<f64>,

    /// Label built from the variation fields
    #[serde(default)]
    pub variation_display: String,
}

impl CartPayload {
    /// Snapshot a cart.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the cart total cannot be computed.
    pub fn from_cart(cart: &Cart<'_>) -> Result<Self, PricingError> {
        Ok(Self {
            cart_id: cart.uuid(),
            buyer_id: cart.buyer(),
            currency: cart.currency().iso_alpha_code.to_string(),
            items: cart.items().iter().map(CartLinePayload::from_line).collect(),
            total_items: cart.total_items(),
            total_amount: cart.total_amount()?.to_minor_units(),
            version: cart.version(),
            created_at: cart.created_at(),
            updated_at: cart.updated_at(),
        })
    }

    /// Rebuild the engine cart from a snapshot. Line totals are recomputed from the unit
    /// price rather than read back.
    ///
    /// # Errors
    ///
    /// Returns a [`WireError`] for unknown currencies or invalid lines.
    pub fn into_cart(self) -> Result<Cart<'static>, WireError> {
        let currency =
            iso::find(&self.currency).ok_or_else(|| WireError::UnknownCurrency(self.currency.clone()))?;

        let items = self
            .items
            .into_iter()
            .map(|line| line.into_line_item(currency))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Cart::restore(
            self.cart_id,
            self.buyer_id,
            currency,
            items,
            self.version,
            self.created_at,
            self.updated_at,
        )?)
    }
}

impl CartLinePayload {
    pub fn from_line(line: &LineItem<'_>) -> Self {
        let details = line.details();

        let mut payload = Self {
            id: line.uuid(),
            line_type: LineType::Regular,
            product_id: details.product,
            product_name: details.product_name.clone(),
            product_image: details.product_image.clone(),
            supplier_id: details.supplier,
            supplier_name: details.supplier_name.clone(),
            quantity: line.quantity(),
            unit_price: line.unit_price().to_minor_units(),
            total_price: line.total_price().to_minor_units(),
            added_at: line.added_at(),
            is_bulk_order: details.is_bulk_order,
            min_order_quantity: details.min_order_quantity,
            max_order_quantity: details.max_order_quantity,
            bulk_discounts: details
                .bulk_discounts
                .iter()
                .map(BulkDiscountPayload::from)
                .collect(),
            unlocked_bulk_discount: line
                .bulk_discount_for(line.quantity())
                .map(BulkDiscountPayload::from),
            variant_id: None,
            variant_name: None,
            color: None,
            size: None,
            material: None,
            style: None,
            variation_attributes: Vec::new(),
            compare_at_price: None,
            request_id: None,
            original_price: None,
            discount_percent: None,
            variation_display: line.variation_display(),
        };

        match line.kind() {
            LineItemKind::Standard(standard) => {
                payload.variant_id.clone_from(&standard.variant_id);
                payload.variant_name.clone_from(&standard.variant_name);
                payload.color.clone_from(&standard.color);
                payload.size.clone_from(&standard.size);
                payload.material.clone_from(&standard.material);
                payload.style.clone_from(&standard.style);
                payload.variation_attributes = standard
                    .attributes
                    .iter()
                    .map(|attribute| AttributePayload {
                        name: attribute.name.clone(),
                        value: attribute.value.clone(),
                    })
                    .collect();
                payload.compare_at_price = standard
                    .compare_at_price
                    .map(|price| price.to_minor_units());
            }
            LineItemKind::Negotiated(negotiated) => {
                payload.line_type = LineType::Bid;
                payload.request_id = Some(negotiated.request);
                payload.original_price = Some(negotiated.original_price.to_minor_units());
                payload.discount_percent = Some(points(&negotiated.discount));
            }
        }

        payload
    }

    fn into_line_item(self, currency: &'static Currency) -> Result<LineItem<'static>, WireError> {
        let kind = match self.line_type {
            LineType::Regular => LineItemKind::Standard(StandardItem {
                variant_id: self.variant_id,
                variant_name: self.variant_name,
                color: self.color,
                size: self.size,
                material: self.material,
                style: self.style,
                attributes: attributes(self.variation_attributes),
                compare_at_price: self
                    .compare_at_price
                    .map(|minor| Money::from_minor(minor, currency)),
            }),
            LineType::Bid => LineItemKind::Negotiated(NegotiatedItem {
                request: self.request_id.ok_or(WireError::MissingField("requestId"))?,
                original_price: Money::from_minor(
                    self.original_price
                        .ok_or(WireError::MissingField("originalPrice"))?,
                    currency,
                ),
                discount: percent(self.discount_percent.unwrap_or_default())?,
            }),
        };

        let mut details = LineItemDetails::new(
            self.product_id,
            self.product_name,
            self.supplier_id,
            self.supplier_name,
        );

        details.product_image = self.product_image;
        details.is_bulk_order = self.is_bulk_order;
        details.min_order_quantity = self.min_order_quantity;
        details.max_order_quantity = self.max_order_quantity;
        details.bulk_discounts = self
            .bulk_discounts
            .into_iter()
            .map(|discount| {
                Ok(BulkDiscount {
                    min_qty: discount.min_qty,
                    discount: percent(discount.discount_percent)?,
                })
            })
            .collect::<Result<Vec<_>, WireError>>()?;

        Ok(LineItem::new(
            self.id,
            self.added_at,
            NewLineItem {
                details,
                kind,
                quantity: self.quantity,
                unit_price: Money::from_minor(self.unit_price, currency),
            },
        )?)
    }
}

fn attributes(payloads: Vec<AttributePayload>) -> Vec<VariationAttribute> {
    payloads
        .into_iter()
        .map(|attribute| VariationAttribute::new(attribute.name, attribute.value))
        .collect()
}

/// `POST /cart` body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemPayload {
    #[serde(rename = "type", default)]
    pub line_type: LineType,

    pub product_id: ProductUuid,
    pub quantity: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,

    #[serde(default, alias = "attributes", skip_serializing_if = "Vec::is_empty")]
    pub variation_attributes: Vec<AttributePayload>,

    #[serde(default)]
    pub is_bulk_order: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestUuid>,

    #[serde(default, alias = "price", skip_serializing_if = "Option::is_none")]
    pub original_price: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<f64>,
}

impl AddItemPayload {
    /// Normalize into an add request.
    ///
    /// # Errors
    ///
    /// Returns a [`WireError`] when a bid lacks its request or quote, or the discount is
    /// out of range.
    pub fn into_add_item(self) -> Result<AddItem, WireError> {
        let kind = match self.line_type {
            LineType::Regular => AddItemKind::Regular(Selection {
                variant_id: self.variant_id,
                variant_name: self.variant_name,
                color: self.color,
                size: self.size,
                material: self.material,
                style: self.style,
                attributes: attributes(self.variation_attributes),
            }),
            LineType::Bid => AddItemKind::Bid(BidTerms {
                request: self.request_id.ok_or(WireError::MissingField("requestId"))?,
                original_price: self
                    .original_price
                    .ok_or(WireError::MissingField("originalPrice"))?,
                discount: percent(self.discount_percent.unwrap_or_default())?,
            }),
        };

        Ok(AddItem {
            product: self.product_id,
            quantity: self.quantity,
            is_bulk_order: self.is_bulk_order,
            kind,
        })
    }
}

/// `PATCH /cart` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuantityPayload {
    pub item_id: LineItemUuid,
    pub quantity: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<u64>,
}

/// `DELETE /cart` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveItemPayload {
    pub item_id: LineItemUuid,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupLinePayload {
    pub item_id: LineItemUuid,
    pub variation_display: String,
    pub quantity: u32,
    pub unit_price: i64,
    pub total_price: i64,
}

/// `GET /cart/groups` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPayload {
    pub product_id: ProductUuid,
    pub supplier_id: SupplierUuid,
    pub product_name: String,
    pub supplier_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_image: Option<String>,

    pub items: Vec<GroupLinePayload>,
    pub total_quantity: u64,
    pub total_price: i64,
    pub below_minimum: bool,
}

impl GroupPayload {
    pub fn from_group(group: &CartGroup<'_, '_>) -> Self {
        Self {
            product_id: group.product(),
            supplier_id: group.supplier(),
            product_name: group.product_name().to_string(),
            supplier_name: group.supplier_name().to_string(),
            product_image: group.product_image().map(str::to_string),
            items: group
                .lines()
                .iter()
                .map(|line| GroupLinePayload {
                    item_id: line.item.uuid(),
                    variation_display: line.variation_display.clone(),
                    quantity: line.item.quantity(),
                    unit_price: line.item.unit_price().to_minor_units(),
                    total_price: line.item.total_price().to_minor_units(),
                })
                .collect(),
            total_quantity: group.total_quantity(),
            total_price: group.total_price().to_minor_units(),
            below_minimum: group.below_minimum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::PKR;
    use serde_json::json;
    use testresult::TestResult;
    use tiercart::pricing::percent_from_basis_points;

    use super::*;

    fn cart() -> Result<Cart<'static>, tiercart::cart::CartError> {
        let mut cart = Cart::new(BuyerUuid::new(), PKR, Timestamp::UNIX_EPOCH);

        let mut details = LineItemDetails::new(
            ProductUuid::new(),
            "Cotton Tee",
            SupplierUuid::new(),
            "Lahore Knits",
        );
        details.min_order_quantity = Some(12);

        cart.add_item(
            NewLineItem {
                details: details.clone(),
                kind: LineItemKind::Standard(StandardItem {
                    color: Some("Red".to_string()),
                    size: Some("M".to_string()),
                    ..StandardItem::default()
                }),
                quantity: 24,
                unit_price: Money::from_minor(11_000, PKR),
            },
            Timestamp::UNIX_EPOCH,
        )?;

        cart.add_item(
            NewLineItem {
                details,
                kind: LineItemKind::Negotiated(NegotiatedItem {
                    request: RequestUuid::new(),
                    original_price: Money::from_minor(10_000, PKR),
                    discount: percent_from_basis_points(1_000),
                }),
                quantity: 100,
                unit_price: Money::from_minor(9_000, PKR),
            },
            Timestamp::UNIX_EPOCH,
        )?;

        Ok(cart)
    }

    #[test]
    fn cart_snapshot_has_contract_totals() -> TestResult {
        let payload = CartPayload::from_cart(&cart()?)?;
        let value = serde_json::to_value(&payload)?;

        assert_eq!(value["totalItems"], json!(124));
        assert_eq!(value["totalAmount"], json!(1_164_000));
        assert_eq!(value["items"][0]["type"], json!("regular"));
        assert_eq!(value["items"][0]["variationDisplay"], json!("Color: Red, Size: M"));
        assert_eq!(value["items"][1]["type"], json!("bid"));
        assert_eq!(value["items"][1]["discountPercent"], json!(10.0));

        Ok(())
    }

    #[test]
    fn lines_report_the_bulk_discount_their_quantity_unlocks() -> TestResult {
        let mut details = LineItemDetails::new(
            ProductUuid::new(),
            "Cotton Tee",
            SupplierUuid::new(),
            "Lahore Knits",
        );
        details.bulk_discounts = vec![
            BulkDiscount {
                min_qty: 10,
                discount: percent_from_basis_points(500),
            },
            BulkDiscount {
                min_qty: 50,
                discount: percent_from_basis_points(1_000),
            },
        ];

        let mut cart = Cart::new(BuyerUuid::new(), PKR, Timestamp::UNIX_EPOCH);
        let id = cart.add_item(
            NewLineItem {
                details,
                kind: LineItemKind::Standard(StandardItem::default()),
                quantity: 24,
                unit_price: Money::from_minor(11_000, PKR),
            },
            Timestamp::UNIX_EPOCH,
        )?;

        let line = cart.item(id).ok_or("expected the line")?;
        let value = serde_json::to_value(CartLinePayload::from_line(line))?;

        assert_eq!(value["unlockedBulkDiscount"]["minQty"], json!(10));
        assert_eq!(value["unlockedBulkDiscount"]["discountPercent"], json!(5.0));

        cart.update_quantity(id, 4, Timestamp::UNIX_EPOCH)?;

        let line = cart.item(id).ok_or("expected the line")?;
        let value = serde_json::to_value(CartLinePayload::from_line(line))?;

        assert!(value.get("unlockedBulkDiscount").is_none());

        Ok(())
    }

    #[test]
    fn snapshots_rebuild_the_same_cart() -> TestResult {
        let original = cart()?;

        let rebuilt = CartPayload::from_cart(&original)?.into_cart()?;

        assert_eq!(rebuilt.uuid(), original.uuid());
        assert_eq!(rebuilt.version(), original.version());
        assert_eq!(rebuilt.total_amount()?, original.total_amount()?);
        assert_eq!(
            rebuilt.items().iter().map(LineItem::variation_key).collect::<Vec<_>>(),
            original.items().iter().map(LineItem::variation_key).collect::<Vec<_>>()
        );

        Ok(())
    }

    #[test]
    fn regular_is_the_default_add_type() -> TestResult {
        let payload: AddItemPayload = serde_json::from_value(json!({
            "productId": "01890a5d-ac96-774b-bcce-b302099a8057",
            "quantity": 12,
            "color": "Red",
            "variationAttributes": [{ "name": "Fit", "value": "Slim" }]
        }))?;

        let item = payload.into_add_item()?;

        let AddItemKind::Regular(selection) = item.kind else {
            return Err("expected a regular line".into());
        };

        assert_eq!(selection.color.as_deref(), Some("Red"));
        assert_eq!(selection.attributes, vec![VariationAttribute::new("Fit", "Slim")]);

        Ok(())
    }

    #[test]
    fn bids_require_a_request_and_a_quote() -> TestResult {
        let payload: AddItemPayload = serde_json::from_value(json!({
            "type": "bid",
            "productId": "01890a5d-ac96-774b-bcce-b302099a8057",
            "quantity": 100,
            "originalPrice": 10_000
        }))?;

        assert!(matches!(
            payload.into_add_item(),
            Err(WireError::MissingField("requestId"))
        ));

        Ok(())
    }

    #[test]
    fn out_of_range_discounts_are_rejected() -> TestResult {
        let payload: AddItemPayload = serde_json::from_value(json!({
            "type": "bid",
            "productId": "01890a5d-ac96-774b-bcce-b302099a8057",
            "quantity": 100,
            "requestId": "01890a5d-ac96-774b-bcce-b302099a8059",
            "originalPrice": 10_000,
            "discountPercent": 140.0
        }))?;

        assert!(matches!(
            payload.into_add_item(),
            Err(WireError::InvalidPercentage(_))
        ));

        Ok(())
    }
}
