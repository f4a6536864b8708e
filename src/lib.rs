//! Tiercart
//!
//! Tiercart is the cart and tiered-pricing engine behind a B2B wholesale marketplace: variation
//! identity, quantity-break pricing, the canonical cart document, display grouping, checkout
//! totals and order materialization.

pub mod cart;
pub mod checkout;
pub mod groups;
pub mod items;
pub mod orders;
pub mod prelude;
pub mod pricing;
pub mod tiers;
pub mod uuids;
pub mod variations;
