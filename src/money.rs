//! Money
//!
//! Amounts are carried as integer minor units (centavos). These helpers
//! convert between minor units, wire decimals and the storefront's display
//! format.

use num_traits::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rusty_money::{Money, iso};
use thiserror::Error;

/// The storefront's only currency.
pub const CURRENCY: &iso::Currency = iso::BRL;

/// Money in the storefront currency.
pub type Brl = Money<'static, iso::Currency>;

/// Errors from parsing user-typed amounts.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MoneyInputError {
    /// The digits do not fit in an `i64` amount of centavos.
    #[error("amount has too many digits")]
    TooLarge,
}

/// Build a [`Brl`] from centavos.
pub fn brl(minor: i64) -> Brl {
    Money::from_minor(minor, CURRENCY)
}

/// Format centavos as `R$ 1.234,56`.
pub fn format_brl(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    let major = abs / 100;
    let fractional = abs % 100;

    format!("{sign}R$ {},{fractional:02}", group_thousands(major))
}

/// Format a [`Money`] value the way [`format_brl`] does.
pub fn format_money(money: &Money<'_, iso::Currency>) -> String {
    format_brl(money.to_minor_units())
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    grouped
}

/// Parse a digits-only amount of centavos, e.g. `"5000"` for R$ 50,00.
///
/// Characters other than ASCII digits are dropped rather than rejected, so
/// `"R$ 50,00"` parses the same as `"5000"`. An input with no digits yields
/// `None`.
///
/// # Errors
///
/// Returns [`MoneyInputError::TooLarge`] when the digits overflow an `i64`.
pub fn parse_digits(raw: &str) -> Result<Option<i64>, MoneyInputError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    if digits.is_empty() {
        return Ok(None);
    }

    digits
        .parse::<i64>()
        .map(Some)
        .map_err(|_overflow| MoneyInputError::TooLarge)
}

/// Convert a wire decimal (major units) to centavos, rounding half away
/// from zero. Returns `None` when the value does not fit.
pub fn minor_from_decimal(value: Decimal) -> Option<i64> {
    value
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Convert centavos to a two-place wire decimal.
pub fn decimal_from_minor(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}
