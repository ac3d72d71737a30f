//! Discounts
//!
//! List-price discount percentages shown next to a price and used for filtering and sorting.

use rust_decimal::{Decimal, RoundingStrategy};
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

/// Errors specific to discount calculations.
#[derive(Debug, Error, PartialEq)]
pub enum DiscountError {
    /// Unit price and list price are in different currencies.
    #[error("unit price is in {0} but list price is in {1}")]
    CurrencyMismatch(&'static str, &'static str),

    /// Percentage calculation could not be safely represented.
    #[error("percentage conversion overflowed")]
    PercentConversion,
}

/// Calculates how far `unit_price` sits below `list_price`, in percent rounded to two places.
///
/// Returns `None` without a list price and zero when the list price does not exceed the unit
/// price. The ratio is reduced before dividing so that scaling both amounts by the same factor
/// gives an identical result.
///
/// # Errors
///
/// - [`DiscountError::CurrencyMismatch`]: the amounts use different currencies.
/// - [`DiscountError::PercentConversion`]: the calculation overflowed.
pub fn list_price_percentage(
    unit_price: &Money<'_, Currency>,
    list_price: Option<&Money<'_, Currency>>,
) -> Result<Option<Decimal>, DiscountError> {
    let Some(list_price) = list_price else {
        return Ok(None);
    };

    if unit_price.currency() != list_price.currency() {
        return Err(DiscountError::CurrencyMismatch(
            unit_price.currency().iso_alpha_code,
            list_price.currency().iso_alpha_code,
        ));
    }

    let unit = unit_price.to_minor_units();
    let list = list_price.to_minor_units();

    if list <= 0 || list <= unit {
        return Ok(Some(Decimal::ZERO));
    }

    let saving = list
        .checked_sub(unit)
        .ok_or(DiscountError::PercentConversion)?;

    let divisor = gcd(saving, list);
    let (numerator, denominator) = (saving / divisor, list / divisor);

    let percentage = Decimal::from(numerator)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.checked_div(Decimal::from(denominator)))
        .ok_or(DiscountError::PercentConversion)?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    Ok(Some(percentage))
}

/// Greatest common divisor of two positive integers.
fn gcd(mut a: i64, mut b: i64) -> i64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }

    a
}
