//! Checkout
//!
//! Turns grouped cart lines into checkout totals. Two flows exist and each has its own
//! named configuration: the cart preview and the full checkout. Neither is a default.

use std::{fmt, str::FromStr};

use decimal_percentage::Percentage;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    groups::CartGroup,
    items::{LineItem, LineItemKind},
    pricing::{PricingError, extend_price, percent_from_points, percent_of, zero},
    tiers::PriceBook,
};

pub mod promo;

pub use promo::{PromoCodes, PromoCodesError, PromoDiscount};

/// Errors raised while calculating totals.
#[derive(Debug, Error, PartialEq)]
pub enum CheckoutError {
    /// The flow does not accept promo codes.
    #[error("promo codes are not supported in the {0} flow")]
    PromoNotSupported(CheckoutFlow),

    /// The promo code is not in the table.
    #[error("unknown promo code: {0}")]
    UnknownPromoCode(String),

    /// A line or configured amount is in another currency (found, expected).
    #[error("amount has currency {0}, but checkout has currency {1}")]
    CurrencyMismatch(&'static str, &'static str),

    /// Money arithmetic failed.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// The call sites that compute totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckoutFlow {
    /// Totals shown alongside the cart
    CartPreview,

    /// Totals charged at checkout
    Checkout,
}

impl CheckoutFlow {
    /// Machine name of the flow.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CartPreview => "cart_preview",
            Self::Checkout => "checkout",
        }
    }
}

impl fmt::Display for CheckoutFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unrecognized flow names.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown checkout flow: {0}")]
pub struct UnknownFlow(pub String);

impl FromStr for CheckoutFlow {
    type Err = UnknownFlow;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "cart_preview" | "cartPreview" | "cart" => Ok(Self::CartPreview),
            "checkout" => Ok(Self::Checkout),
            other => Err(UnknownFlow(other.to_string())),
        }
    }
}

/// Settings for one checkout flow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckoutConfig<'a> {
    /// Which flow these settings belong to
    pub flow: CheckoutFlow,

    /// Shipping is free when the subtotal is strictly above this amount
    pub free_shipping_threshold: Money<'a, Currency>,

    /// Flat shipping fee otherwise
    pub shipping_fee: Money<'a, Currency>,

    /// Tax on the subtotal, when the flow charges tax
    pub tax_rate: Option<Percentage>,

    /// Whether promo codes are accepted
    pub promo_codes: bool,
}

impl<'a> CheckoutConfig<'a> {
    /// Cart preview: free shipping above 20,000, otherwise 300; no tax; promo codes accepted.
    pub fn cart_preview(currency: &'a Currency) -> Self {
        Self {
            flow: CheckoutFlow::CartPreview,
            free_shipping_threshold: Money::from_major(20_000, currency),
            shipping_fee: Money::from_major(300, currency),
            tax_rate: None,
            promo_codes: true,
        }
    }

    /// Full checkout: free shipping above 50,000, otherwise 500; 17% tax; no promo codes.
    pub fn checkout(currency: &'a Currency) -> Self {
        Self {
            flow: CheckoutFlow::Checkout,
            free_shipping_threshold: Money::from_major(50_000, currency),
            shipping_fee: Money::from_major(500, currency),
            tax_rate: Some(percent_from_points(17.0)),
            promo_codes: false,
        }
    }

    /// The named configuration for a flow.
    pub fn for_flow(flow: CheckoutFlow, currency: &'a Currency) -> Self {
        match flow {
            CheckoutFlow::CartPreview => Self::cart_preview(currency),
            CheckoutFlow::Checkout => Self::checkout(currency),
        }
    }

    /// Override the free-shipping threshold.
    #[must_use]
    pub fn with_free_shipping_threshold(mut self, threshold: Money<'a, Currency>) -> Self {
        self.free_shipping_threshold = threshold;
        self
    }

    /// Override the flat shipping fee.
    #[must_use]
    pub fn with_shipping_fee(mut self, fee: Money<'a, Currency>) -> Self {
        self.shipping_fee = fee;
        self
    }

    /// Override the tax rate.
    #[must_use]
    pub fn with_tax_rate(mut self, rate: Option<Percentage>) -> Self {
        self.tax_rate = rate;
        self
    }

    /// Override promo-code support.
    #[must_use]
    pub fn with_promo_codes(mut self, enabled: bool) -> Self {
        self.promo_codes = enabled;
        self
    }

    /// Currency the configuration is expressed in.
    pub fn currency(&self) -> &'a Currency {
        self.shipping_fee.currency()
    }
}

/// Where a line's effective unit price comes from.
#[derive(Debug, Clone, Copy)]
pub enum PricingBasis<'b, 'a> {
    /// The unit price committed on the line
    StoredUnitPrice,

    /// Re-resolved from each product's tier schedule against the group's combined
    /// quantity. Negotiated lines and products without a schedule keep their stored price.
    TierResolved(&'b PriceBook<'a>),
}

/// A line with its effective price under a [`PricingBasis`].
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine<'c, 'a> {
    /// The canonical line
    pub item: &'c LineItem<'a>,

    /// Effective unit price
    pub unit_price: Money<'a, Currency>,

    /// Effective unit price × quantity
    pub line_total: Money<'a, Currency>,

    /// Savings against the line's reference price
    pub savings: Money<'a, Currency>,
}

/// Price every line in the groups.
///
/// # Errors
///
/// Returns a [`CheckoutError`] when a line is in another currency or arithmetic fails.
pub fn price_lines<'c, 'a>(
    groups: &[CartGroup<'c, 'a>],
    basis: PricingBasis<'_, 'a>,
    currency: &'a Currency,
) -> Result<Vec<PricedLine<'c, 'a>>, CheckoutError> {
    let mut priced = Vec::new();

    for group in groups {
        let group_quantity = u32::try_from(group.total_quantity()).unwrap_or(u32::MAX);

        for line in group.lines() {
            let item = line.item;

            check_currency(item.unit_price(), currency)?;

            let unit_price = effective_unit_price(item, basis, group_quantity);
            let line_total = extend_price(&unit_price, item.quantity())?;
            let savings = savings_for(item, &unit_price, currency)?;

            priced.push(PricedLine {
                item,
                unit_price,
                line_total,
                savings,
            });
        }
    }

    Ok(priced)
}

fn effective_unit_price<'a>(
    item: &LineItem<'a>,
    basis: PricingBasis<'_, 'a>,
    group_quantity: u32,
) -> Money<'a, Currency> {
    match (basis, item.kind()) {
        (PricingBasis::TierResolved(book), LineItemKind::Standard(_)) => book
            .schedule(item.product())
            .and_then(|schedule| schedule.unit_price(group_quantity))
            .unwrap_or(*item.unit_price()),
        (PricingBasis::TierResolved(_), LineItemKind::Negotiated(_))
        | (PricingBasis::StoredUnitPrice, _) => *item.unit_price(),
    }
}

fn savings_for<'a>(
    item: &LineItem<'a>,
    unit_price: &Money<'a, Currency>,
    currency: &'a Currency,
) -> Result<Money<'a, Currency>, CheckoutError> {
    let Some(reference) = item.reference_price() else {
        return Ok(zero(currency));
    };

    check_currency(reference, currency)?;

    let difference = reference.to_minor_units() - unit_price.to_minor_units();

    if difference <= 0 {
        return Ok(zero(currency));
    }

    Ok(extend_price(
        &Money::from_minor(difference, currency),
        item.quantity(),
    )?)
}

fn check_currency(amount: &Money<'_, Currency>, currency: &Currency) -> Result<(), CheckoutError> {
    if amount.currency() == currency {
        Ok(())
    } else {
        Err(CheckoutError::CurrencyMismatch(
            amount.currency().iso_alpha_code,
            currency.iso_alpha_code,
        ))
    }
}

/// Checkout totals for one flow.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutTotals<'a> {
    /// Flow the totals were calculated for
    pub flow: CheckoutFlow,

    /// Sum of effective line totals
    pub subtotal: Money<'a, Currency>,

    /// Sum of savings against reference prices
    pub savings: Money<'a, Currency>,

    /// Shipping charge
    pub shipping: Money<'a, Currency>,

    /// Promo discount off the subtotal
    pub promo_discount: Money<'a, Currency>,

    /// Applied promo code, if any
    pub promo_code: Option<String>,

    /// Tax on the subtotal, for flows that charge tax
    pub tax: Option<Money<'a, Currency>>,

    /// Subtotal + shipping + tax − promo discount
    pub total: Money<'a, Currency>,

    /// Sum of quantities
    pub total_quantity: u64,
}

/// Calculate totals for grouped lines.
///
/// # Errors
///
/// Returns [`CheckoutError::PromoNotSupported`] when a promo is passed to a flow that
/// does not accept them, or another [`CheckoutError`] when amounts cannot be combined.
pub fn calculate_totals<'a>(
    groups: &[CartGroup<'_, 'a>],
    config: &CheckoutConfig<'a>,
    basis: PricingBasis<'_, 'a>,
    promo: Option<&PromoDiscount>,
) -> Result<CheckoutTotals<'a>, CheckoutError> {
    if promo.is_some() && !config.promo_codes {
        return Err(CheckoutError::PromoNotSupported(config.flow));
    }

    let currency = config.currency();

    check_currency(&config.free_shipping_threshold, currency)?;

    let priced = price_lines(groups, basis, currency)?;

    let mut subtotal = zero(currency);
    let mut savings = zero(currency);
    let mut total_quantity: u64 = 0;

    for line in &priced {
        subtotal = subtotal.add(line.line_total).map_err(PricingError::from)?;
        savings = savings.add(line.savings).map_err(PricingError::from)?;
        total_quantity = total_quantity.saturating_add(u64::from(line.item.quantity()));
    }

    let shipping = if subtotal.to_minor_units() > config.free_shipping_threshold.to_minor_units() {
        zero(currency)
    } else {
        config.shipping_fee
    };

    let promo_discount = promo
        .map(|promo| percent_of(&subtotal, &promo.percent))
        .transpose()?
        .unwrap_or_else(|| zero(currency));

    let tax = config
        .tax_rate
        .map(|rate| percent_of(&subtotal, &rate))
        .transpose()?;

    let mut total = subtotal.add(shipping).map_err(PricingError::from)?;

    if let Some(tax) = tax {
        total = total.add(tax).map_err(PricingError::from)?;
    }

    total = total.sub(promo_discount).map_err(PricingError::from)?;

    Ok(CheckoutTotals {
        flow: config.flow,
        subtotal,
        savings,
        shipping,
        promo_discount,
        promo_code: promo.map(|promo| promo.code.clone()),
        tax,
        total,
        total_quantity,
    })
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use rusty_money::iso::{GBP, USD};
    use testresult::TestResult;

    use crate::{
        cart::Cart,
        groups::group_cart,
        items::{LineItemKind, NegotiatedItem, StandardItem, tests::standard_line},
        tiers::{PriceSchedule, PriceTier},
        uuids::{BuyerUuid, ProductUuid, RequestUuid, SupplierUuid},
    };

    use super::*;

    /// A cart with one line whose total is `major` whole currency units.
    fn cart_worth<'a>(major: i64) -> Result<Cart<'a>, crate::cart::CartError> {
        let mut cart = Cart::new(BuyerUuid::new(), GBP, Timestamp::now());

        cart.add_item(
            standard_line(ProductUuid::new(), SupplierUuid::new(), 1, major * 100),
            Timestamp::now(),
        )?;

        Ok(cart)
    }

    fn preview_totals<'a>(
        cart: &Cart<'a>,
        promo: Option<&PromoDiscount>,
    ) -> Result<CheckoutTotals<'a>, CheckoutError> {
        let groups = group_cart(cart)?;

        calculate_totals(
            &groups,
            &CheckoutConfig::cart_preview(GBP),
            PricingBasis::StoredUnitPrice,
            promo,
        )
    }

    #[test]
    fn shipping_is_charged_at_or_below_threshold() -> TestResult {
        let totals = preview_totals(&cart_worth(18_000)?, None)?;

        assert_eq!(totals.subtotal, Money::from_major(18_000, GBP));
        assert_eq!(totals.shipping, Money::from_major(300, GBP));
        assert_eq!(totals.total, Money::from_major(18_300, GBP));
        assert_eq!(totals.tax, None);

        let at_threshold = preview_totals(&cart_worth(20_000)?, None)?;

        assert_eq!(at_threshold.shipping, Money::from_major(300, GBP));

        Ok(())
    }

    #[test]
    fn shipping_is_free_above_threshold() -> TestResult {
        let totals = preview_totals(&cart_worth(25_000)?, None)?;

        assert_eq!(totals.shipping, Money::from_major(0, GBP));

        Ok(())
    }

    #[test]
    fn checkout_flow_charges_tax() -> TestResult {
        let cart = cart_worth(25_000)?;
        let groups = group_cart(&cart)?;

        let config = CheckoutConfig::checkout(GBP)
            .with_free_shipping_threshold(Money::from_major(20_000, GBP));

        let totals = calculate_totals(&groups, &config, PricingBasis::StoredUnitPrice, None)?;

        assert_eq!(totals.tax, Some(Money::from_major(4_250, GBP)));
        assert_eq!(totals.shipping, Money::from_major(0, GBP));
        assert_eq!(totals.total, Money::from_major(29_250, GBP));

        Ok(())
    }

    #[test]
    fn checkout_flow_uses_its_own_threshold_and_fee() -> TestResult {
        let cart = cart_worth(25_000)?;
        let groups = group_cart(&cart)?;

        let totals = calculate_totals(
            &groups,
            &CheckoutConfig::checkout(GBP),
            PricingBasis::StoredUnitPrice,
            None,
        )?;

        assert_eq!(totals.shipping, Money::from_major(500, GBP));
        assert_eq!(totals.total, Money::from_major(29_750, GBP));

        Ok(())
    }

    #[test]
    fn promo_code_discounts_the_subtotal() -> TestResult {
        let promo = PromoCodes::default().lookup("SAVE10")?;
        let totals = preview_totals(&cart_worth(10_000)?, Some(&promo))?;

        assert_eq!(totals.promo_discount, Money::from_major(1_000, GBP));
        assert_eq!(totals.promo_code.as_deref(), Some("SAVE10"));
        assert_eq!(
            totals.total,
            Money::from_major(10_000 + 300 - 1_000, GBP)
        );

        Ok(())
    }

    #[test]
    fn checkout_flow_rejects_promo_codes() -> TestResult {
        let promo = PromoCodes::default().lookup("SAVE10")?;
        let cart = cart_worth(10_000)?;
        let groups = group_cart(&cart)?;

        let result = calculate_totals(
            &groups,
            &CheckoutConfig::checkout(GBP),
            PricingBasis::StoredUnitPrice,
            Some(&promo),
        );

        assert_eq!(
            result,
            Err(CheckoutError::PromoNotSupported(CheckoutFlow::Checkout))
        );

        Ok(())
    }

    #[test]
    fn tier_resolved_basis_prices_against_group_quantity() -> TestResult {
        let product = ProductUuid::new();
        let supplier = SupplierUuid::new();
        let mut cart = Cart::new(BuyerUuid::new(), GBP, Timestamp::now());

        cart.add_item(standard_line(product, supplier, 30, 11_000), Timestamp::now())?;
        cart.add_item(standard_line(product, supplier, 30, 11_000), Timestamp::now())?;

        let mut book = PriceBook::new();
        book.insert(
            product,
            PriceSchedule::new([
                PriceTier::new(1, Some(49), Money::from_major(110, GBP)),
                PriceTier::new(50, Some(199), Money::from_major(100, GBP)),
                PriceTier::new(200, None, Money::from_major(95, GBP)),
            ])?,
        );

        let groups = group_cart(&cart)?;

        let stored = calculate_totals(
            &groups,
            &CheckoutConfig::cart_preview(GBP),
            PricingBasis::StoredUnitPrice,
            None,
        )?;
        let resolved = calculate_totals(
            &groups,
            &CheckoutConfig::cart_preview(GBP),
            PricingBasis::TierResolved(&book),
            None,
        )?;

        assert_eq!(stored.subtotal, Money::from_major(6_600, GBP));
        assert_eq!(resolved.subtotal, Money::from_major(6_000, GBP));
        assert_eq!(resolved.total_quantity, 60);

        Ok(())
    }

    #[test]
    fn negotiated_lines_keep_their_price_and_report_savings() -> TestResult {
        let product = ProductUuid::new();
        let mut cart = Cart::new(BuyerUuid::new(), GBP, Timestamp::now());

        let mut bid = standard_line(product, SupplierUuid::new(), 10, 17_000);
        bid.kind = LineItemKind::Negotiated(NegotiatedItem {
            request: RequestUuid::new(),
            original_price: Money::from_minor(20_000, GBP),
            discount: percent_from_points(15.0),
        });

        cart.add_item(bid, Timestamp::now())?;

        let mut book = PriceBook::new();
        book.insert(
            product,
            PriceSchedule::new([PriceTier::new(1, None, Money::from_minor(1, GBP))])?,
        );

        let groups = group_cart(&cart)?;
        let totals = calculate_totals(
            &groups,
            &CheckoutConfig::cart_preview(GBP),
            PricingBasis::TierResolved(&book),
            None,
        )?;

        assert_eq!(totals.subtotal, Money::from_minor(170_000, GBP));
        assert_eq!(totals.savings, Money::from_minor(30_000, GBP));

        Ok(())
    }

    #[test]
    fn compare_at_price_below_effective_price_is_not_a_saving() -> TestResult {
        let mut cart = Cart::new(BuyerUuid::new(), GBP, Timestamp::now());

        let mut line = standard_line(ProductUuid::new(), SupplierUuid::new(), 2, 1_000);
        line.kind = LineItemKind::Standard(StandardItem {
            compare_at_price: Some(Money::from_minor(900, GBP)),
            ..StandardItem::default()
        });

        cart.add_item(line, Timestamp::now())?;

        assert_eq!(preview_totals(&cart, None)?.savings, Money::from_minor(0, GBP));

        Ok(())
    }

    #[test]
    fn config_in_another_currency_is_rejected() -> TestResult {
        let cart = cart_worth(100)?;
        let groups = group_cart(&cart)?;

        let result = calculate_totals(
            &groups,
            &CheckoutConfig::cart_preview(USD),
            PricingBasis::StoredUnitPrice,
            None,
        );

        assert_eq!(result, Err(CheckoutError::CurrencyMismatch("GBP", "USD")));

        Ok(())
    }

    #[test]
    fn flow_names_parse() -> TestResult {
        assert_eq!("cart_preview".parse::<CheckoutFlow>()?, CheckoutFlow::CartPreview);
        assert_eq!("checkout".parse::<CheckoutFlow>()?, CheckoutFlow::Checkout);
        assert!("express".parse::<CheckoutFlow>().is_err());

        Ok(())
    }
}
