//! Cart
//!
//! The canonical cart document for one buyer. Lines are kept in the order they were added
//! and every change to the contents bumps the cart's version, which callers can use as an
//! optimistic concurrency token.

use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    items::{LineItem, LineItemError, NewLineItem},
    pricing::{PricingError, total_price},
    uuids::{BuyerUuid, CartUuid, LineItemUuid},
};

/// Errors raised by cart commands.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// The line itself is invalid.
    #[error(transparent)]
    Item(#[from] LineItemError),

    /// No line with this id exists in the cart.
    #[error("line item {0} not found")]
    ItemNotFound(LineItemUuid),

    /// A line is priced in a different currency than the cart (line currency, cart currency).
    #[error("line has currency {0}, but cart has currency {1}")]
    CurrencyMismatch(&'static str, &'static str),

    /// The caller's view of the cart is stale.
    #[error("cart version is {actual}, expected {expected}")]
    VersionConflict {
        /// Version the caller last saw
        expected: u64,

        /// Current version
        actual: u64,
    },

    /// Totals could not be computed.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// A buyer's in-progress order.
#[derive(Debug, Clone, PartialEq)]
pub struct Cart<'a> {
    uuid: CartUuid,
    buyer: BuyerUuid,
    currency: &'static Currency,
    items: Vec<LineItem<'a>>,
    version: u64,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl<'a> Cart<'a> {
    /// Create an empty cart for a buyer.
    pub fn new(buyer: BuyerUuid, currency: &'static Currency, now: Timestamp) -> Self {
        Self {
            uuid: CartUuid::new(),
            buyer,
            currency,
            items: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a cart from stored state.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::CurrencyMismatch`] when a stored line is priced in another currency.
    pub fn restore(
        uuid: CartUuid,
        buyer: BuyerUuid,
        currency: &'static Currency,
        items: Vec<LineItem<'a>>,
        version: u64,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Result<Self, CartError> {
        let cart = Self {
            uuid,
            buyer,
            currency,
            items,
            version,
            created_at,
            updated_at,
        };

        cart.items
            .iter()
            .try_for_each(|item| cart.check_currency(item.unit_price()))?;

        Ok(cart)
    }

    /// Cart identifier
    pub fn uuid(&self) -> CartUuid {
        self.uuid
    }

    /// Owning buyer
    pub fn buyer(&self) -> BuyerUuid {
        self.buyer
    }

    /// Cart currency
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Lines in the order they were added
    pub fn items(&self) -> &[LineItem<'a>] {
        &self.items
    }

    /// Find a line by id.
    pub fn item(&self, id: LineItemUuid) -> Option<&LineItem<'a>> {
        self.items.iter().find(|item| item.uuid() == id)
    }

    /// Current version
    pub fn version(&self) -> u64 {
        self.version
    }

    /// When the cart was created
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// When the cart contents last changed
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Number of lines
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` when the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of quantities across all lines.
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity())).sum()
    }

    /// Sum of the committed line totals.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the sum cannot be computed.
    pub fn total_amount(&self) -> Result<Money<'a, Currency>, PricingError> {
        total_price(self.items.iter().map(|item| *item.total_price()), self.currency)
    }

    /// Fail with [`CartError::VersionConflict`] unless the cart is at `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::VersionConflict`] on mismatch.
    pub fn check_version(&self, expected: u64) -> Result<(), CartError> {
        if self.version == expected {
            Ok(())
        } else {
            Err(CartError::VersionConflict {
                expected,
                actual: self.version,
            })
        }
    }

    /// Append a new line. Lines are never merged, even when an identical variation is
    /// already in the cart.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] when the line is invalid or priced in another currency.
    pub fn add_item(
        &mut self,
        item: NewLineItem<'a>,
        now: Timestamp,
    ) -> Result<LineItemUuid, CartError> {
        self.check_currency(&item.unit_price)?;

        let line = LineItem::new(LineItemUuid::new(), now, item)?;
        let uuid = line.uuid();

        self.items.push(line);
        self.touch(now);

        Ok(uuid)
    }

    /// Set a line's quantity. A quantity of zero or less removes the line instead.
    ///
    /// Returns whether the cart changed.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] when setting a positive quantity on an absent line,
    /// or a [`CartError::Item`] when the quantity cannot be applied.
    pub fn update_quantity(
        &mut self,
        id: LineItemUuid,
        quantity: i64,
        now: Timestamp,
    ) -> Result<bool, CartError> {
        if quantity <= 0 {
            return Ok(self.remove_item(id, now));
        }

        let quantity =
            u32::try_from(quantity).map_err(|_err| LineItemError::InvalidQuantity(quantity))?;

        let line = self
            .items
            .iter_mut()
            .find(|item| item.uuid() == id)
            .ok_or(CartError::ItemNotFound(id))?;

        if line.quantity() == quantity {
            return Ok(false);
        }

        line.set_quantity(quantity)?;
        self.touch(now);

        Ok(true)
    }

    /// Remove a line. Removing an absent line is a no-op.
    ///
    /// Returns whether a line was removed.
    pub fn remove_item(&mut self, id: LineItemUuid, now: Timestamp) -> bool {
        let before = self.items.len();

        self.items.retain(|item| item.uuid() != id);

        let removed = self.items.len() != before;

        if removed {
            self.touch(now);
        }

        removed
    }

    /// Remove every line, returning how many were removed.
    pub fn clear(&mut self, now: Timestamp) -> usize {
        let removed = self.items.len();

        if removed > 0 {
            self.items.clear();
            self.touch(now);
        }

        removed
    }

    fn check_currency(&self, price: &Money<'_, Currency>) -> Result<(), CartError> {
        if price.currency() == self.currency {
            Ok(())
        } else {
            Err(CartError::CurrencyMismatch(
                price.currency().iso_alpha_code,
                self.currency.iso_alpha_code,
            ))
        }
    }

    fn touch(&mut self, now: Timestamp) {
        self.version = self.version.saturating_add(1);
        self.updated_at = now;
    }
}
