//! Cart Groups
//!
//! Display grouping of cart lines by (product, supplier). Grouping never touches the
//! canonical lines: group totals are sums of each line's committed total.

use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;

use crate::{
    cart::Cart,
    items::LineItem,
    pricing::{PricingError, zero},
    uuids::{ProductUuid, SupplierUuid},
};

/// A line within a group, with its variation label.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupLine<'c, 'a> {
    /// The canonical line
    pub item: &'c LineItem<'a>,

    /// Variation label for display
    pub variation_display: String,
}

/// All lines for one product from one supplier.
#[derive(Debug, Clone, PartialEq)]
pub struct CartGroup<'c, 'a> {
    product: ProductUuid,
    supplier: SupplierUuid,
    lines: SmallVec<[GroupLine<'c, 'a>; 4]>,
    total_quantity: u64,
    total_price: Money<'a, Currency>,
}

impl<'c, 'a> CartGroup<'c, 'a> {
    fn new(first: &'c LineItem<'a>, currency: &'a Currency) -> Self {
        Self {
            product: first.product(),
            supplier: first.supplier(),
            lines: SmallVec::new(),
            total_quantity: 0,
            total_price: zero(currency),
        }
    }

    fn push(&mut self, item: &'c LineItem<'a>) -> Result<(), PricingError> {
        self.total_price = self.total_price.add(*item.total_price())?;
        self.total_quantity = self
            .total_quantity
            .checked_add(u64::from(item.quantity()))
            .ok_or(PricingError::Overflow)?;

        self.lines.push(GroupLine {
            item,
            variation_display: item.variation_display(),
        });

        Ok(())
    }

    /// Grouped product
    pub fn product(&self) -> ProductUuid {
        self.product
    }

    /// Grouped supplier
    pub fn supplier(&self) -> SupplierUuid {
        self.supplier
    }

    /// Product name, taken from the first line.
    pub fn product_name(&self) -> &str {
        self.lines
            .first()
            .map_or("", |line| line.item.details().product_name.as_str())
    }

    /// Supplier name, taken from the first line.
    pub fn supplier_name(&self) -> &str {
        self.lines
            .first()
            .map_or("", |line| line.item.details().supplier_name.as_str())
    }

    /// Product image, taken from the first line that has one.
    pub fn product_image(&self) -> Option<&str> {
        self.lines
            .iter()
            .find_map(|line| line.item.details().product_image.as_deref())
    }

    /// Member lines in cart order
    pub fn lines(&self) -> &[GroupLine<'c, 'a>] {
        &self.lines
    }

    /// Sum of member quantities
    pub fn total_quantity(&self) -> u64 {
        self.total_quantity
    }

    /// Sum of member line totals
    pub fn total_price(&self) -> &Money<'a, Currency> {
        &self.total_price
    }

    /// Returns `true` when the group's combined quantity is under the product's minimum
    /// order quantity. Informational only; carts may hold such groups.
    pub fn below_minimum(&self) -> bool {
        self.lines
            .iter()
            .find_map(|line| line.item.details().min_order_quantity)
            .is_some_and(|minimum| self.total_quantity < u64::from(minimum))
    }
}

/// Group lines by (product, supplier), in order of first appearance.
///
/// # Errors
///
/// Returns a [`PricingError`] if a line is in another currency or a sum overflows.
pub fn group_items<'c, 'a>(
    items: &'c [LineItem<'a>],
    currency: &'a Currency,
) -> Result<Vec<CartGroup<'c, 'a>>, PricingError> {
    let mut groups: Vec<CartGroup<'c, 'a>> = Vec::new();
    let mut index: FxHashMap<(ProductUuid, SupplierUuid), usize> = FxHashMap::default();

    for item in items {
        let key = (item.product(), item.supplier());

        let position = *index.entry(key).or_insert_with(|| {
            groups.push(CartGroup::new(item, currency));
            groups.len() - 1
        });

        if let Some(group) = groups.get_mut(position) {
            group.push(item)?;
        }
    }

    Ok(groups)
}

/// Group a cart's lines.
///
/// # Errors
///
/// Returns a [`PricingError`] if a sum overflows.
pub fn group_cart<'c, 'a>(cart: &'c Cart<'a>) -> Result<Vec<CartGroup<'c, 'a>>, PricingError> {
    group_items(cart.items(), cart.currency())
}
