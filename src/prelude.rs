//! Tiercart prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{Cart, CartError},
    checkout::{
        CheckoutConfig, CheckoutError, CheckoutFlow, CheckoutTotals, PricedLine, PricingBasis,
        PromoCodes, PromoCodesError, PromoDiscount, calculate_totals, price_lines,
    },
    groups::{CartGroup, GroupLine, group_cart, group_items},
    items::{
        BulkDiscount, LineItem, LineItemDetails, LineItemError, LineItemKind, NegotiatedItem,
        NewLineItem, STANDARD_PRODUCT, StandardItem,
    },
    orders::{
        Address, AddressField, CheckoutForm, CheckoutRequest, DropshippingDetails,
        OrderValidationError, materialize,
    },
    pricing::{PricingError, percent_from_points},
    tiers::{PriceBook, PriceSchedule, PriceTier, ProductPricing, TierError, resolve_tier_index},
    uuids::{BuyerUuid, CartUuid, LineItemUuid, ProductUuid, RequestUuid, SupplierUuid, TypedUuid},
    variations::{VariationAttribute, VariationCombination, VariationKey},
};
