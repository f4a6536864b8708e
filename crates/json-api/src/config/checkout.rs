//! Checkout Flows Config

use std::path::PathBuf;

use clap::Args;
use rusty_money::{Money, iso};
use thiserror::Error;

use tiercart::{
    checkout::{CheckoutConfig, PromoCodes, PromoCodesError},
    pricing::percent_from_points,
};
use tiercart_app::domain::checkout::CheckoutSettings;

#[derive(Debug, Error)]
pub enum CheckoutConfigError {
    #[error("unknown currency: {0}")]
    UnknownCurrency(String),

    #[error("tax percentage must be between 0 and 100, got {0}")]
    InvalidTax(f64),

    #[error(transparent)]
    PromoCodes(#[from] PromoCodesError),
}

/// Checkout flow settings. Amounts are in major units of the cart currency.
#[derive(Debug, Args)]
pub struct CheckoutFlowsConfig {
    /// ISO currency code for carts
    #[arg(long, env = "CART_CURRENCY", default_value = "PKR")]
    pub currency: String,

    /// Cart preview: shipping is free above this subtotal
    #[arg(long, env = "PREVIEW_FREE_SHIPPING_THRESHOLD", default_value_t = 20_000_i64)]
    pub preview_free_shipping_threshold: i64,

    /// Cart preview: flat shipping fee
    #[arg(long, env = "PREVIEW_SHIPPING_FEE", default_value_t = 300_i64)]
    pub preview_shipping_fee: i64,

    /// Checkout: shipping is free above this subtotal
    #[arg(long, env = "CHECKOUT_FREE_SHIPPING_THRESHOLD", default_value_t = 50_000_i64)]
    pub checkout_free_shipping_threshold: i64,

    /// Checkout: flat shipping fee
    #[arg(long, env = "CHECKOUT_SHIPPING_FEE", default_value_t = 500_i64)]
    pub checkout_shipping_fee: i64,

    /// Checkout: tax on the subtotal in percent; 0 disables tax
    #[arg(long, env = "CHECKOUT_TAX_PERCENT", default_value_t = 17.0_f64)]
    pub checkout_tax_percent: f64,

    /// Promo code table (YAML); the built-in codes are used when omitted
    #[arg(long, env = "PROMO_CODES_PATH")]
    pub promo_codes_path: Option<PathBuf>,
}

impl CheckoutFlowsConfig {
    /// Cart currency.
    ///
    /// # Errors
    ///
    /// Returns an error for codes rusty-money does not know.
    pub fn currency(&self) -> Result<&'static iso::Currency, CheckoutConfigError> {
        iso::find(self.currency.trim())
            .ok_or_else(|| CheckoutConfigError::UnknownCurrency(self.currency.clone()))
    }

    /// Build the flow configurations and promo table.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown currency, an out-of-range tax rate or an
    /// unreadable promo table.
    pub fn settings(&self) -> Result<CheckoutSettings, CheckoutConfigError> {
        let currency = self.currency()?;

        let tax = self.checkout_tax_percent;

        if !tax.is_finite() || !(0.0..=100.0).contains(&tax) {
            return Err(CheckoutConfigError::InvalidTax(tax));
        }

        let tax_rate = (tax > 0.0).then(|| percent_from_points(tax));

        let cart_preview = CheckoutConfig::cart_preview(currency)
            .with_free_shipping_threshold(Money::from_major(
                self.preview_free_shipping_threshold,
                currency,
            ))
            .with_shipping_fee(Money::from_major(self.preview_shipping_fee, currency));

        let checkout = CheckoutConfig::checkout(currency)
            .with_free_shipping_threshold(Money::from_major(
                self.checkout_free_shipping_threshold,
                currency,
            ))
            .with_shipping_fee(Money::from_major(self.checkout_shipping_fee, currency))
            .with_tax_rate(tax_rate);

        let promo_codes = match &self.promo_codes_path {
            Some(path) => PromoCodes::from_path(path)?,
            None => PromoCodes::default(),
        };

        Ok(CheckoutSettings {
            cart_preview,
            checkout,
            promo_codes,
        })
    }
}
