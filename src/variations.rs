//! Variations
//!
//! Canonical identity for the product variation a cart line refers to.

use std::fmt;

use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;

use crate::uuids::RequestUuid;

/// Placeholder value suppliers use for "no selection".
pub const DEFAULT_VALUE: &str = "default";

/// Returns `true` when a variation value carries no selection.
pub fn is_placeholder(value: &str) -> bool {
    let value = value.trim();

    value.is_empty() || value.eq_ignore_ascii_case(DEFAULT_VALUE)
}

/// A single `{name, value}` variation pair, e.g. `color = Red`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariationAttribute {
    /// Attribute name
    pub name: String,

    /// Attribute value
    pub value: String,
}

impl VariationAttribute {
    /// Create a new attribute pair.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Canonical identity of a line's selected variation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VariationKey {
    /// The product without any variation selected.
    Base,

    /// A supplier-assigned variant identifier.
    Variant(String),

    /// A set of attribute pairs, sorted by name with names lower-cased.
    Combination(SmallVec<[(String, String); 4]>),

    /// A line priced by a supplier's answer to a custom request.
    Negotiated(RequestUuid),
}

impl VariationKey {
    /// Build a combination key from attribute pairs.
    ///
    /// Placeholder values are dropped and names are compared case-insensitively; when
    /// the same name appears twice the first occurrence wins. An empty set yields
    /// [`VariationKey::Base`].
    pub fn from_attributes<'v, I>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (&'v str, &'v str)>,
    {
        let mut pairs: SmallVec<[(String, String); 4]> = SmallVec::new();

        for (name, value) in attributes {
            if is_placeholder(value) || name.trim().is_empty() {
                continue;
            }

            let name = name.trim().to_lowercase();

            if pairs.iter().any(|(existing, _)| *existing == name) {
                continue;
            }

            pairs.push((name, value.trim().to_owned()));
        }

        if pairs.is_empty() {
            return Self::Base;
        }

        pairs.sort_by(|a, b| a.0.cmp(&b.0));

        Self::Combination(pairs)
    }

    /// Returns `true` for [`VariationKey::Base`].
    pub fn is_base(&self) -> bool {
        matches!(self, Self::Base)
    }
}

impl fmt::Display for VariationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base => f.write_str("base"),
            Self::Variant(id) => write!(f, "variant:{id}"),
            Self::Combination(pairs) => {
                for (index, (name, value)) in pairs.iter().enumerate() {
                    if index > 0 {
                        f.write_str(";")?;
                    }

                    write!(f, "{name}={value}")?;
                }

                Ok(())
            }
            Self::Negotiated(request) => write!(f, "request:{request}"),
        }
    }
}

/// One concrete, addressable SKU of a product.
#[derive(Debug, Clone, PartialEq)]
pub struct VariationCombination<'a> {
    /// Supplier identifier for the SKU
    pub id: String,

    /// The attribute pairs that define the SKU
    pub attributes: Vec<VariationAttribute>,

    /// SKU price
    pub price: Money<'a, Currency>,

    /// Units in stock, when tracked
    pub stock: Option<u32>,
}

impl VariationCombination<'_> {
    /// The canonical key of this combination's attributes.
    pub fn key(&self) -> VariationKey {
        VariationKey::from_attributes(
            self.attributes
                .iter()
                .map(|attribute| (attribute.name.as_str(), attribute.value.as_str())),
        )
    }

    /// Returns `true` when the key addresses this combination, by id or by attributes.
    pub fn matches(&self, key: &VariationKey) -> bool {
        match key {
            VariationKey::Variant(id) => *id == self.id,
            VariationKey::Combination(_) => self.key() == *key,
            VariationKey::Base | VariationKey::Negotiated(_) => false,
        }
    }
}
