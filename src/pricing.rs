//! Pricing
//!
//! Money arithmetic shared by the cart, the tier resolver and the checkout calculator.
//! Amounts are carried as [`Money`] and computed in minor units.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

/// Errors raised by money arithmetic.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// A multiplication or sum left the range of minor units.
    #[error("amount overflowed the representable range")]
    Overflow,

    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Zero in the given currency.
pub fn zero(currency: &Currency) -> Money<'_, Currency> {
    Money::from_minor(0, currency)
}

/// Unit price multiplied by a quantity.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] when the product does not fit in minor units.
pub fn extend_price<'a>(
    unit: &Money<'a, Currency>,
    quantity: u32,
) -> Result<Money<'a, Currency>, PricingError> {
    let minor = unit
        .to_minor_units()
        .checked_mul(i64::from(quantity))
        .ok_or(PricingError::Overflow)?;

    Ok(Money::from_minor(minor, unit.currency()))
}

/// The given percentage of an amount, rounded half away from zero to whole minor units.
///
/// # Errors
///
/// Returns [`PricingError::PercentConversion`] when the result cannot be represented.
pub fn percent_of<'a>(
    amount: &Money<'a, Currency>,
    percent: &Percentage,
) -> Result<Money<'a, Currency>, PricingError> {
    let minor = percent_of_minor(percent, amount.to_minor_units())?;

    Ok(Money::from_minor(minor, amount.currency()))
}

/// Calculate a percentage of a minor unit amount.
///
/// # Errors
///
/// Returns [`PricingError::PercentConversion`] when the multiplication overflows.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, PricingError> {
    let minor = Decimal::from_i64(minor).ok_or(PricingError::PercentConversion)?;

    ((*percent) * Decimal::ONE) // the percentage type does not expose its inner Decimal
        .checked_mul(minor)
        .ok_or(PricingError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(PricingError::PercentConversion)
}

/// Build a percentage from a figure expressed in points (`17.0` is 17%).
pub fn percent_from_points(points: f64) -> Percentage {
    Percentage::from(points / 100.0)
}

/// Express a percentage in points (`0.17` becomes `17`).
pub fn percent_points(percent: &Percentage) -> Decimal {
    ((*percent) * Decimal::ONE_HUNDRED).round_dp(6).normalize()
}

/// Build a percentage from basis points (`1_700` is 17%).
pub fn percent_from_basis_points(basis_points: i64) -> Percentage {
    Percentage::from(Decimal::new(basis_points, 4))
}

/// Express a percentage in whole basis points, rounding half away from zero.
pub fn basis_points(percent: &Percentage) -> Option<i64> {
    ((*percent) * Decimal::ONE)
        .checked_mul(Decimal::from(10_000))?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Sum a sequence of amounts in a single currency.
///
/// # Errors
///
/// Returns [`PricingError::Money`] when an amount is in a different currency.
pub fn total_price<'a, I>(amounts: I, currency: &'a Currency) -> Result<Money<'a, Currency>, PricingError>
where
    I: IntoIterator<Item = Money<'a, Currency>>,
{
    amounts
        .into_iter()
        .try_fold(zero(currency), |acc, amount| Ok(acc.add(amount)?))
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{GBP, USD};
    use testresult::TestResult;

    use super::*;

    #[test]
    fn extend_price_multiplies_minor_units() -> TestResult {
        let unit = Money::from_minor(1_250, GBP);

        assert_eq!(extend_price(&unit, 4)?, Money::from_minor(5_000, GBP));

        Ok(())
    }

    #[test]
    fn extend_price_overflow_returns_error() {
        let unit = Money::from_minor(i64::MAX, GBP);

        assert_eq!(extend_price(&unit, 2), Err(PricingError::Overflow));
    }

    #[test]
    fn percent_of_rounds_half_away_from_zero() -> TestResult {
        let amount = Money::from_minor(25, GBP);
        let half = Percentage::from(0.5);

        assert_eq!(percent_of(&amount, &half)?, Money::from_minor(13, GBP));

        Ok(())
    }

    #[test]
    fn percent_of_minor_overflow_returns_error() {
        let percent = Percentage::from(2.0);

        assert_eq!(
            percent_of_minor(&percent, i64::MAX),
            Err(PricingError::PercentConversion)
        );
    }

    #[test]
    fn percent_points_round_trip() {
        let percent = percent_from_points(17.0);

        assert_eq!(percent_points(&percent), Decimal::from(17));
    }

    #[test]
    fn basis_points_round_trip() {
        let percent = percent_from_basis_points(1_250);

        assert_eq!(basis_points(&percent), Some(1_250));
        assert_eq!(basis_points(&percent_from_points(17.0)), Some(1_700));
    }

    #[test]
    fn total_price_sums_amounts() -> TestResult {
        let amounts = [Money::from_minor(100, GBP), Money::from_minor(250, GBP)];

        assert_eq!(total_price(amounts, GBP)?, Money::from_minor(350, GBP));

        Ok(())
    }

    #[test]
    fn total_price_of_nothing_is_zero() -> TestResult {
        assert_eq!(total_price([], GBP)?, Money::from_minor(0, GBP));

        Ok(())
    }

    #[test]
    fn total_price_currency_mismatch_errors() {
        let amounts = [Money::from_minor(100, GBP), Money::from_minor(250, USD)];

        assert!(matches!(
            total_price(amounts, GBP),
            Err(PricingError::Money(_))
        ));
    }
}
