//! Price Tiers
//!
//! Quantity-break pricing. A [`PriceSchedule`] is an ascending list of [`PriceTier`]s and
//! [`resolve_tier_index`] picks the tier that applies to a requested quantity.

use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    uuids::ProductUuid,
    variations::{VariationCombination, VariationKey},
};

/// Errors raised while building a price schedule.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TierError {
    /// A tier starts below the tier before it.
    #[error("tier {0} starts below the previous tier")]
    Unordered(usize),

    /// A tier's maximum quantity is below its minimum.
    #[error("tier {0} has a maximum quantity below its minimum")]
    InvertedRange(usize),

    /// A tier is priced in a different currency than the first tier.
    #[error("tier {0} has currency {1}, but the schedule has currency {2}")]
    CurrencyMismatch(usize, &'static str, &'static str),

    /// A tier has a negative price.
    #[error("tier {0} has a negative price")]
    NegativePrice(usize),
}

/// A quantity break: `price` applies from `min_qty` up to `max_qty` (inclusive, unbounded when `None`).
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTier<'a> {
    min_qty: u32,
    max_qty: Option<u32>,
    price: Money<'a, Currency>,
}

impl<'a> PriceTier<'a> {
    /// Create a new tier.
    pub fn new(min_qty: u32, max_qty: Option<u32>, price: Money<'a, Currency>) -> Self {
        Self {
            min_qty,
            max_qty,
            price,
        }
    }

    /// Minimum quantity for this tier.
    pub fn min_qty(&self) -> u32 {
        self.min_qty
    }

    /// Maximum quantity for this tier, `None` when unbounded.
    pub fn max_qty(&self) -> Option<u32> {
        self.max_qty
    }

    /// Unit price for this tier.
    pub fn price(&self) -> &Money<'a, Currency> {
        &self.price
    }

    /// Returns `true` when `quantity` falls inside the tier's explicit range.
    pub fn contains(&self, quantity: u32) -> bool {
        quantity >= self.min_qty && self.max_qty.is_none_or(|max| quantity <= max)
    }
}

/// Resolve the index of the tier that applies to `quantity`.
///
/// Tier 0 is the default. Every tier is scanned: a tier qualifies when `quantity` reaches
/// its minimum and either falls inside its range or the tier is the last one in the
/// schedule. Later qualifying tiers replace earlier ones, so the highest satisfied tier
/// wins. Returns `None` only for an empty schedule.
pub fn resolve_tier_index(tiers: &[PriceTier<'_>], quantity: u32) -> Option<usize> {
    let last = tiers.len().checked_sub(1)?;

    let selected = tiers
        .iter()
        .enumerate()
        .filter(|(index, tier)| {
            quantity >= tier.min_qty && (tier.contains(quantity) || *index == last)
        })
        .map(|(index, _)| index)
        .last()
        .unwrap_or(0);

    Some(selected)
}

/// An ordered set of price tiers for one product.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSchedule<'a> {
    tiers: SmallVec<[PriceTier<'a>; 4]>,
}

impl<'a> PriceSchedule<'a> {
    /// Build a schedule, checking tier order, ranges, prices and currency.
    ///
    /// # Errors
    ///
    /// Returns a [`TierError`] describing the first invalid tier.
    pub fn new(tiers: impl IntoIterator<Item = PriceTier<'a>>) -> Result<Self, TierError> {
        let tiers: SmallVec<[PriceTier<'a>; 4]> = tiers.into_iter().collect();

        let mut previous_min = 0;

        for (index, tier) in tiers.iter().enumerate() {
            if tier.min_qty < previous_min {
                return Err(TierError::Unordered(index));
            }

            if tier.max_qty.is_some_and(|max| max < tier.min_qty) {
                return Err(TierError::InvertedRange(index));
            }

            if tier.price.is_negative() {
                return Err(TierError::NegativePrice(index));
            }

            if let Some(first) = tiers.first()
                && first.price.currency() != tier.price.currency()
            {
                return Err(TierError::CurrencyMismatch(
                    index,
                    tier.price.currency().iso_alpha_code,
                    first.price.currency().iso_alpha_code,
                ));
            }

            previous_min = tier.min_qty;
        }

        Ok(Self { tiers })
    }

    /// A schedule with no tiers.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The tiers, in ascending order.
    pub fn tiers(&self) -> &[PriceTier<'a>] {
        &self.tiers
    }

    /// Returns `true` when the schedule has no tiers.
    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// The tier that applies to `quantity`.
    pub fn resolve(&self, quantity: u32) -> Option<&PriceTier<'a>> {
        resolve_tier_index(&self.tiers, quantity).and_then(|index| self.tiers.get(index))
    }

    /// The unit price that applies to `quantity`.
    pub fn unit_price(&self, quantity: u32) -> Option<Money<'a, Currency>> {
        self.resolve(quantity).map(|tier| tier.price)
    }
}

/// Everything the engine needs to price one catalog product.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPricing<'a> {
    /// Catalog list price
    pub base_price: Money<'a, Currency>,

    /// Quantity breaks, possibly empty
    pub schedule: PriceSchedule<'a>,

    /// Addressable SKUs
    pub combinations: Vec<VariationCombination<'a>>,
}

impl<'a> ProductPricing<'a> {
    /// Pricing with a single list price and nothing else.
    pub fn flat(base_price: Money<'a, Currency>) -> Self {
        Self {
            base_price,
            schedule: PriceSchedule::empty(),
            combinations: Vec::new(),
        }
    }

    /// The combination addressed by `key`, if any.
    pub fn combination(&self, key: &VariationKey) -> Option<&VariationCombination<'a>> {
        self.combinations
            .iter()
            .find(|combination| combination.matches(key))
    }

    /// Unit price for a variation at a quantity.
    ///
    /// The tier schedule wins when present, then the addressed combination's own
    /// price, then the list price.
    pub fn unit_price_for(&self, key: &VariationKey, quantity: u32) -> Money<'a, Currency> {
        if let Some(price) = self.schedule.unit_price(quantity) {
            return price;
        }

        self.combination(key)
            .map_or(self.base_price, |combination| combination.price)
    }
}

/// Tier schedules for a set of products, used by tier-resolved checkout pricing.
#[derive(Debug, Clone, Default)]
pub struct PriceBook<'a> {
    schedules: FxHashMap<ProductUuid, PriceSchedule<'a>>,
}

impl<'a> PriceBook<'a> {
    /// An empty price book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a product's schedule, replacing any previous one.
    pub fn insert(&mut self, product: ProductUuid, schedule: PriceSchedule<'a>) {
        self.schedules.insert(product, schedule);
    }

    /// The schedule for a product, if one is registered and non-empty.
    pub fn schedule(&self, product: ProductUuid) -> Option<&PriceSchedule<'a>> {
        self.schedules
            .get(&product)
            .filter(|schedule| !schedule.is_empty())
    }

    /// Number of products in the book.
    pub fn len(&self) -> usize {
        self.schedules.len()
    }

    /// Returns `true` when no product is registered.
    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }
}
