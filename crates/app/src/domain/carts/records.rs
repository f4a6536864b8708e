//! Cart Records

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Row, postgres::PgRow, types::Json};
use uuid::Uuid;

use tiercart::{
    items::{
        BulkDiscount, LineItem, LineItemDetails, LineItemKind, NegotiatedItem, NewLineItem,
        StandardItem,
    },
    pricing::{basis_points, percent_from_basis_points},
    uuids::{BuyerUuid, CartUuid, LineItemUuid, ProductUuid, RequestUuid, SupplierUuid},
    variations::VariationAttribute,
};

use crate::domain::carts::errors::CartsServiceError;

pub(crate) const KIND_STANDARD: &str = "standard";
pub(crate) const KIND_NEGOTIATED: &str = "negotiated";

/// Cart Record
#[derive(Debug, Clone)]
pub(crate) struct CartRecord {
    pub uuid: CartUuid,
    pub buyer: BuyerUuid,
    pub currency: String,
    pub version: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CartRecord {
    pub(crate) fn currency(&self) -> Result<&'static Currency, CartsServiceError> {
        iso::find(&self.currency)
            .ok_or_else(|| CartsServiceError::InvalidData(format!("unknown currency {}", self.currency)))
    }

    pub(crate) fn version(&self) -> Result<u64, CartsServiceError> {
        u64::try_from(self.version)
            .map_err(|source| CartsServiceError::InvalidData(format!("cart version: {source}")))
    }
}

impl<'r> FromRow<'r, PgRow> for CartRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: CartUuid::from_uuid(row.try_get("uuid")?),
            buyer: BuyerUuid::from_uuid(row.try_get("buyer_uuid")?),
            currency: row.try_get("currency")?,
            version: row.try_get("version")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct BulkDiscountRecord {
    pub min_qty: u32,
    pub basis_points: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct AttributeRecord {
    pub name: String,
    pub value: String,
}

/// Cart Line Record
#[derive(Debug, Clone)]
pub(crate) struct LineItemRecord {
    pub uuid: Uuid,
    pub added_at: Timestamp,
    pub kind: String,
    pub product_uuid: Uuid,
    pub product_name: String,
    pub product_image: Option<String>,
    pub supplier_uuid: Uuid,
    pub supplier_name: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub total_price: i64,
    pub is_bulk_order: bool,
    pub min_order_quantity: Option<i64>,
    pub max_order_quantity: Option<i64>,
    pub bulk_discounts: Json<Vec<BulkDiscountRecord>>,
    pub variant_id: Option<String>,
    pub variant_name: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub material: Option<String>,
    pub style: Option<String>,
    pub attributes: Json<Vec<AttributeRecord>>,
    pub compare_at_price: Option<i64>,
    pub request_uuid: Option<Uuid>,
    pub original_price: Option<i64>,
    pub discount_basis_points: Option<i64>,
}

impl<'r> FromRow<'r, PgRow> for LineItemRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: row.try_get("uuid")?,
            added_at: row.try_get::<SqlxTimestamp, _>("added_at")?.to_jiff(),
            kind: row.try_get("kind")?,
            product_uuid: row.try_get("product_uuid")?,
            product_name: row.try_get("product_name")?,
            product_image: row.try_get("product_image")?,
            supplier_uuid: row.try_get("supplier_uuid")?,
            supplier_name: row.try_get("supplier_name")?,
            quantity: row.try_get("quantity")?,
            unit_price: row.try_get("unit_price")?,
            total_price: row.try_get("total_price")?,
            is_bulk_order: row.try_get("is_bulk_order")?,
            min_order_quantity: row.try_get("min_order_quantity")?,
            max_order_quantity: row.try_get("max_order_quantity")?,
            bulk_discounts: row.try_get("bulk_discounts")?,
            variant_id: row.try_get("variant_id")?,
            variant_name: row.try_get("variant_name")?,
            color: row.try_get("color")?,
            size: row.try_get("size")?,
            material: row.try_get("material")?,
            style: row.try_get("style")?,
            attributes: row.try_get("attributes")?,
            compare_at_price: row.try_get("compare_at_price")?,
            request_uuid: row.try_get("request_uuid")?,
            original_price: row.try_get("original_price")?,
            discount_basis_points: row.try_get("discount_basis_points")?,
        })
    }
}

fn invalid(field: &str) -> CartsServiceError {
    CartsServiceError::InvalidData(format!("cart line {field} is out of range"))
}

fn quantity(value: i64, field: &str) -> Result<u32, CartsServiceError> {
    u32::try_from(value).map_err(|_err| invalid(field))
}

impl LineItemRecord {
    /// Build a record for insertion from a committed line.
    pub(crate) fn from_line(line: &LineItem<'_>) -> Result<Self, CartsServiceError> {
        let details = line.details();

        let bulk_discounts = details
            .bulk_discounts
            .iter()
            .map(|discount| {
                Ok(BulkDiscountRecord {
                    min_qty: discount.min_qty,
                    basis_points: basis_points(&discount.discount)
                        .ok_or_else(|| invalid("bulk discount"))?,
                })
            })
            .collect::<Result<Vec<_>, CartsServiceError>>()?;

        let mut record = Self {
            uuid: line.uuid().into_uuid(),
            added_at: line.added_at(),
            kind: KIND_STANDARD.to_string(),
            product_uuid: details.product.into_uuid(),
            product_name: details.product_name.clone(),
            product_image: details.product_image.clone(),
            supplier_uuid: details.supplier.into_uuid(),
            supplier_name: details.supplier_name.clone(),
            quantity: i64::from(line.quantity()),
            unit_price: line.unit_price().to_minor_units(),
            total_price: line.total_price().to_minor_units(),
            is_bulk_order: details.is_bulk_order,
            min_order_quantity: details.min_order_quantity.map(i64::from),
            max_order_quantity: details.max_order_quantity.map(i64::from),
            bulk_discounts: Json(bulk_discounts),
            variant_id: None,
            variant_name: None,
            color: None,
            size: None,
            material: None,
            style: None,
            attributes: Json(Vec::new()),
            compare_at_price: None,
            request_uuid: None,
            original_price: None,
            discount_basis_points: None,
        };

        match line.kind() {
            LineItemKind::Standard(standard) => {
                record.variant_id.clone_from(&standard.variant_id);
                record.variant_name.clone_from(&standard.variant_name);
                record.color.clone_from(&standard.color);
                record.size.clone_from(&standard.size);
                record.material.clone_from(&standard.material);
                record.style.clone_from(&standard.style);
                record.attributes = Json(
                    standard
                        .attributes
                        .iter()
                        .map(|attribute| AttributeRecord {
                            name: attribute.name.clone(),
                            value: attribute.value.clone(),
                        })
                        .collect(),
                );
                record.compare_at_price = standard
                    .compare_at_price
                    .map(|price| price.to_minor_units());
            }
            LineItemKind::Negotiated(negotiated) => {
                record.kind = KIND_NEGOTIATED.to_string();
                record.request_uuid = Some(negotiated.request.into_uuid());
                record.original_price = Some(negotiated.original_price.to_minor_units());
                record.discount_basis_points =
                    Some(basis_points(&negotiated.discount).ok_or_else(|| invalid("discount"))?);
            }
        }

        Ok(record)
    }

    /// Rebuild the engine line. The total is recomputed rather than trusted.
    pub(crate) fn into_line_item(
        self,
        currency: &'static Currency,
    ) -> Result<LineItem<'static>, CartsServiceError> {
        let kind = match self.kind.as_str() {
            KIND_STANDARD => LineItemKind::Standard(StandardItem {
                variant_id: self.variant_id,
                variant_name: self.variant_name,
                color: self.color,
                size: self.size,
                material: self.material,
                style: self.style,
                attributes: self
                    .attributes
                    .0
                    .into_iter()
                    .map(|attribute| VariationAttribute::new(attribute.name, attribute.value))
                    .collect(),
                compare_at_price: self
                    .compare_at_price
                    .map(|minor| Money::from_minor(minor, currency)),
            }),
            KIND_NEGOTIATED => LineItemKind::Negotiated(NegotiatedItem {
                request: RequestUuid::from_uuid(
                    self.request_uuid.ok_or_else(|| invalid("request"))?,
                ),
                original_price: Money::from_minor(
                    self.original_price.ok_or_else(|| invalid("original price"))?,
                    currency,
                ),
                discount: percent_from_basis_points(
                    self.discount_basis_points.ok_or_else(|| invalid("discount"))?,
                ),
            }),
            other => {
                return Err(CartsServiceError::InvalidData(format!(
                    "unknown cart line kind {other}"
                )));
            }
        };

        let details = LineItemDetails {
            product: ProductUuid::from_uuid(self.product_uuid),
            product_name: self.product_name,
            product_image: self.product_image,
            supplier: SupplierUuid::from_uuid(self.supplier_uuid),
            supplier_name: self.supplier_name,
            is_bulk_order: self.is_bulk_order,
            min_order_quantity: self
                .min_order_quantity
                .map(|value| quantity(value, "minimum order quantity"))
                .transpose()?,
            max_order_quantity: self
                .max_order_quantity
                .map(|value| quantity(value, "maximum order quantity"))
                .transpose()?,
            bulk_discounts: self
                .bulk_discounts
                .0
                .into_iter()
                .map(|discount| BulkDiscount {
                    min_qty: discount.min_qty,
                    discount: percent_from_basis_points(discount.basis_points),
                })
                .collect(),
        };

        let item = NewLineItem {
            details,
            kind,
            quantity: quantity(self.quantity, "quantity")?,
            unit_price: Money::from_minor(self.unit_price, currency),
        };

        LineItem::new(LineItemUuid::from_uuid(self.uuid), self.added_at, item)
            .map_err(|source| CartsServiceError::InvalidData(source.to_string()))
    }
}
