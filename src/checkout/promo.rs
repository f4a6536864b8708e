//! Promo Codes
//!
//! A flat code to percentage table. Codes are matched trimmed and upper-cased.

use std::{collections::BTreeMap, fs, path::Path};

use decimal_percentage::Percentage;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use thiserror::Error;

use crate::{checkout::CheckoutError, pricing::percent_from_points};

/// Errors raised while loading a promo-code table.
#[derive(Debug, Error)]
pub enum PromoCodesError {
    /// IO error reading the table
    #[error("Failed to read promo code file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// A percentage outside `(0, 100]`
    #[error("Invalid percentage for promo code {0}: {1}")]
    InvalidPercentage(String, f64),

    /// A blank code
    #[error("Promo codes must not be blank")]
    BlankCode,
}

#[derive(Debug, Deserialize)]
struct PromoCodesFile {
    codes: BTreeMap<String, f64>,
}

/// A promo code resolved against the table.
#[derive(Debug, Clone, PartialEq)]
pub struct PromoDiscount {
    /// Normalized code
    pub code: String,

    /// Discount off the subtotal
    pub percent: Percentage,
}

/// Promo-code table.
#[derive(Debug, Clone)]
pub struct PromoCodes {
    codes: FxHashMap<String, Percentage>,
}

impl Default for PromoCodes {
    fn default() -> Self {
        let mut codes = Self::empty();

        codes.codes.insert("SAVE10".to_string(), percent_from_points(10.0));
        codes
            .codes
            .insert("WELCOME15".to_string(), percent_from_points(15.0));

        codes
    }
}

impl PromoCodes {
    /// A table with no codes.
    pub fn empty() -> Self {
        Self {
            codes: FxHashMap::default(),
        }
    }

    /// Parse a table from YAML of the form `codes: { SAVE10: 10 }`.
    ///
    /// # Errors
    ///
    /// Returns a [`PromoCodesError`] when the YAML is malformed or a code is invalid.
    pub fn from_yaml_str(contents: &str) -> Result<Self, PromoCodesError> {
        let file: PromoCodesFile = serde_norway::from_str(contents)?;
        let mut codes = Self::empty();

        for (code, points) in file.codes {
            codes.insert(&code, points)?;
        }

        Ok(codes)
    }

    /// Load a table from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns a [`PromoCodesError`] when the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PromoCodesError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml_str(&contents)
    }

    /// Add or replace a code, with its discount in points (`10.0` is 10%).
    ///
    /// # Errors
    ///
    /// Returns a [`PromoCodesError`] for blank codes or percentages outside `(0, 100]`.
    pub fn insert(&mut self, code: &str, points: f64) -> Result<(), PromoCodesError> {
        let code = normalize(code);

        if code.is_empty() {
            return Err(PromoCodesError::BlankCode);
        }

        if !points.is_finite() || points <= 0.0 || points > 100.0 {
            return Err(PromoCodesError::InvalidPercentage(code, points));
        }

        self.codes.insert(code, percent_from_points(points));

        Ok(())
    }

    /// Resolve a code.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::UnknownPromoCode`] when the code is not in the table.
    pub fn lookup(&self, code: &str) -> Result<PromoDiscount, CheckoutError> {
        let code = normalize(code);

        self.codes
            .get(&code)
            .map(|percent| PromoDiscount {
                code: code.clone(),
                percent: *percent,
            })
            .ok_or(CheckoutError::UnknownPromoCode(code))
    }

    /// Number of codes in the table
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Returns `true` when the table has no codes.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_uppercase()
}
