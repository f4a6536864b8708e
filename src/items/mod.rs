//! Line Items
//!
//! The canonical line shape held by a cart. Every line shares [`LineItemDetails`] and is
//! either a catalog ([`StandardItem`]) or a negotiated ([`NegotiatedItem`]) line.

use decimal_percentage::Percentage;
use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    pricing::{PricingError, extend_price, percent_of},
    uuids::{LineItemUuid, ProductUuid, RequestUuid, SupplierUuid},
    variations::{VariationAttribute, VariationKey},
};

pub mod display;

pub use display::STANDARD_PRODUCT;

/// Errors raised while building or changing a line item.
#[derive(Debug, Error, PartialEq)]
pub enum LineItemError {
    /// Quantity must be at least one.
    #[error("quantity must be at least 1, got {0}")]
    InvalidQuantity(i64),

    /// Unit price must not be negative.
    #[error("unit price must not be negative")]
    NegativeUnitPrice,

    /// The line total could not be computed.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// A quantity break on a product's bulk-discount schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BulkDiscount {
    /// Minimum quantity for the discount to apply
    pub min_qty: u32,

    /// Discount off the unit price
    pub discount: Percentage,
}

/// Attributes shared by every kind of line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItemDetails {
    /// Catalog product
    pub product: ProductUuid,

    /// Product name at the time the line was added
    pub product_name: String,

    /// Product image, if any
    pub product_image: Option<String>,

    /// Supplier selling the product
    pub supplier: SupplierUuid,

    /// Supplier name at the time the line was added
    pub supplier_name: String,

    /// Whether the line was added through the bulk-order flow
    pub is_bulk_order: bool,

    /// Minimum order quantity
    pub min_order_quantity: Option<u32>,

    /// Maximum order quantity
    pub max_order_quantity: Option<u32>,

    /// Bulk-discount schedule, ascending by `min_qty`
    pub bulk_discounts: Vec<BulkDiscount>,
}

impl LineItemDetails {
    /// Details with only the required identity fields set.
    pub fn new(
        product: ProductUuid,
        product_name: impl Into<String>,
        supplier: SupplierUuid,
        supplier_name: impl Into<String>,
    ) -> Self {
        Self {
            product,
            product_name: product_name.into(),
            product_image: None,
            supplier,
            supplier_name: supplier_name.into(),
            is_bulk_order: false,
            min_order_quantity: None,
            max_order_quantity: None,
            bulk_discounts: Vec::new(),
        }
    }
}

/// A line priced from the catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StandardItem<'a> {
    /// Supplier variant identifier
    pub variant_id: Option<String>,

    /// Supplier variant label
    pub variant_name: Option<String>,

    /// Selected color
    pub color: Option<String>,

    /// Selected size
    pub size: Option<String>,

    /// Selected material
    pub material: Option<String>,

    /// Selected style
    pub style: Option<String>,

    /// Generic variation pairs, in the order the supplier listed them
    pub attributes: Vec<VariationAttribute>,

    /// List price before tier or bulk pricing, used for savings
    pub compare_at_price: Option<Money<'a, Currency>>,
}

impl StandardItem<'_> {
    /// Explicit variation fields paired with their display names.
    pub fn explicit_fields(&self) -> [(&'static str, Option<&str>); 4] {
        [
            ("Color", self.color.as_deref()),
            ("Size", self.size.as_deref()),
            ("Material", self.material.as_deref()),
            ("Style", self.style.as_deref()),
        ]
    }

    /// Canonical key for the selected variation.
    ///
    /// A variant id wins; otherwise explicit fields and generic attributes are merged
    /// into a combination, explicit fields first.
    pub fn variation_key(&self) -> VariationKey {
        if let Some(id) = self
            .variant_id
            .as_deref()
            .filter(|id| !crate::variations::is_placeholder(id))
        {
            return VariationKey::Variant(id.trim().to_owned());
        }

        let explicit = self
            .explicit_fields()
            .into_iter()
            .filter_map(|(name, value)| value.map(|value| (name, value)));

        let generic = self
            .attributes
            .iter()
            .map(|attribute| (attribute.name.as_str(), attribute.value.as_str()));

        VariationKey::from_attributes(explicit.chain(generic))
    }
}

/// A line priced by a supplier's answer to a custom request.
#[derive(Debug, Clone, PartialEq)]
pub struct NegotiatedItem<'a> {
    /// Originating request
    pub request: RequestUuid,

    /// Price originally quoted by the supplier
    pub original_price: Money<'a, Currency>,

    /// Discount relative to the quote
    pub discount: Percentage,
}

impl<'a> NegotiatedItem<'a> {
    /// The quoted price less the negotiated discount.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] when the discount cannot be applied.
    pub fn negotiated_price(&self) -> Result<Money<'a, Currency>, PricingError> {
        let discount = percent_of(&self.original_price, &self.discount)?;

        Ok(self.original_price.sub(discount)?)
    }
}

/// The kind of a line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineItemKind<'a> {
    /// Catalog line
    Standard(StandardItem<'a>),

    /// Negotiated (bid) line
    Negotiated(NegotiatedItem<'a>),
}

/// A line item that has not been committed to a cart yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLineItem<'a> {
    /// Shared attributes
    pub details: LineItemDetails,

    /// Kind-specific attributes
    pub kind: LineItemKind<'a>,

    /// Requested quantity
    pub quantity: u32,

    /// Unit price the line is committed at
    pub unit_price: Money<'a, Currency>,
}

/// A committed cart line. The total is recomputed on every quantity change.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem<'a> {
    uuid: LineItemUuid,
    added_at: Timestamp,
    details: LineItemDetails,
    kind: LineItemKind<'a>,
    quantity: u32,
    unit_price: Money<'a, Currency>,
    total_price: Money<'a, Currency>,
}

impl<'a> LineItem<'a> {
    /// Commit a new line.
    ///
    /// # Errors
    ///
    /// Returns a [`LineItemError`] when the quantity is zero, the unit price is negative
    /// or the total overflows.
    pub fn new(
        uuid: LineItemUuid,
        added_at: Timestamp,
        item: NewLineItem<'a>,
    ) -> Result<Self, LineItemError> {
        if item.quantity == 0 {
            return Err(LineItemError::InvalidQuantity(0));
        }

        if item.unit_price.is_negative() {
            return Err(LineItemError::NegativeUnitPrice);
        }

        let total_price = extend_price(&item.unit_price, item.quantity)?;

        Ok(Self {
            uuid,
            added_at,
            details: item.details,
            kind: item.kind,
            quantity: item.quantity,
            unit_price: item.unit_price,
            total_price,
        })
    }

    /// Line identifier
    pub fn uuid(&self) -> LineItemUuid {
        self.uuid
    }

    /// When the line was added
    pub fn added_at(&self) -> Timestamp {
        self.added_at
    }

    /// Shared attributes
    pub fn details(&self) -> &LineItemDetails {
        &self.details
    }

    /// Kind-specific attributes
    pub fn kind(&self) -> &LineItemKind<'a> {
        &self.kind
    }

    /// Catalog product
    pub fn product(&self) -> ProductUuid {
        self.details.product
    }

    /// Supplier
    pub fn supplier(&self) -> SupplierUuid {
        self.details.supplier
    }

    /// Quantity
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Committed unit price
    pub fn unit_price(&self) -> &Money<'a, Currency> {
        &self.unit_price
    }

    /// Committed line total, always `unit_price × quantity`.
    pub fn total_price(&self) -> &Money<'a, Currency> {
        &self.total_price
    }

    /// Returns `true` for negotiated lines.
    pub fn is_negotiated(&self) -> bool {
        matches!(self.kind, LineItemKind::Negotiated(_))
    }

    /// Change the quantity and recompute the total.
    ///
    /// # Errors
    ///
    /// Returns a [`LineItemError`] when the quantity is zero or the total overflows. The
    /// line is left unchanged on error.
    pub fn set_quantity(&mut self, quantity: u32) -> Result<(), LineItemError> {
        if quantity == 0 {
            return Err(LineItemError::InvalidQuantity(0));
        }

        self.total_price = extend_price(&self.unit_price, quantity)?;
        self.quantity = quantity;

        Ok(())
    }

    /// Canonical identity of the selected variation.
    pub fn variation_key(&self) -> VariationKey {
        match &self.kind {
            LineItemKind::Standard(standard) => standard.variation_key(),
            LineItemKind::Negotiated(negotiated) => VariationKey::Negotiated(negotiated.request),
        }
    }

    /// The price savings are measured against: the negotiated quote or the catalog
    /// compare-at price.
    pub fn reference_price(&self) -> Option<&Money<'a, Currency>> {
        match &self.kind {
            LineItemKind::Standard(standard) => standard.compare_at_price.as_ref(),
            LineItemKind::Negotiated(negotiated) => Some(&negotiated.original_price),
        }
    }

    /// The deepest bulk discount unlocked at `quantity`.
    pub fn bulk_discount_for(&self, quantity: u32) -> Option<&BulkDiscount> {
        self.details
            .bulk_discounts
            .iter()
            .filter(|discount| quantity >= discount.min_qty)
            .max_by_key(|discount| discount.min_qty)
    }

    /// Returns `true` when the line's quantity is under the product's minimum order quantity.
    pub fn below_minimum(&self) -> bool {
        self.details
            .min_order_quantity
            .is_some_and(|minimum| self.quantity < minimum)
    }

    /// Human readable label for the selected variation.
    pub fn variation_display(&self) -> String {
        match &self.kind {
            LineItemKind::Standard(standard) => display::variation_display(standard),
            LineItemKind::Negotiated(_) => STANDARD_PRODUCT.to_string(),
        }
    }
}
