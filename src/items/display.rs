//! Variation labels

use crate::{items::StandardItem, variations::is_placeholder};

/// Label used when a line carries no variation selection.
pub const STANDARD_PRODUCT: &str = "Standard Product";

/// Build the variation label for a catalog line.
///
/// Sources are tried in order and the first that yields anything wins: the explicit
/// color/size/material/style fields, then the generic attribute list, then the variant
/// name. Placeholder values are skipped everywhere.
pub fn variation_display(item: &StandardItem<'_>) -> String {
    let explicit = join_pairs(
        item.explicit_fields()
            .into_iter()
            .filter_map(|(name, value)| value.map(|value| (name, value))),
    );

    if let Some(label) = explicit {
        return label;
    }

    let generic = join_pairs(
        item.attributes
            .iter()
            .map(|attribute| (attribute.name.trim(), attribute.value.as_str())),
    );

    if let Some(label) = generic {
        return label;
    }

    item.variant_name
        .as_deref()
        .filter(|name| !is_placeholder(name))
        .map_or_else(|| STANDARD_PRODUCT.to_string(), |name| name.trim().to_owned())
}

fn join_pairs<'v>(pairs: impl Iterator<Item = (&'v str, &'v str)>) -> Option<String> {
    let parts: Vec<String> = pairs
        .filter(|(name, value)| !name.is_empty() && !is_placeholder(value))
        .map(|(name, value)| format!("{name}: {}", value.trim()))
        .collect();

    (!parts.is_empty()).then(|| parts.join(", "))
}
