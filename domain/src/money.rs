//! Decimal money helpers.
//!
//! Amounts travel over JSON as strings (`"1234.50"`) so no float rounding
//! ever touches a quote total.

use rust_decimal::prelude::*;

/// Monetary amount. Always compared after [`round_money`].
pub type Money = Decimal;

const MONEY_PLACES: u32 = 2;
const RATE_PLACES: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("empty amount")]
    Empty,
    #[error("invalid amount: {0}")]
    Invalid(String),
    #[error("amount must not be negative: {0}")]
    Negative(String),
}

/// Round to cents, midpoint away from zero (`2.345` -> `2.35`).
#[must_use]
pub fn round_money(value: Decimal) -> Money {
    value.round_dp_with_strategy(MONEY_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a rate to the four places the tax-rate column holds.
#[must_use]
pub fn round_rate(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(RATE_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Parse user-entered money such as `"$1,250.00"` or `" 99.9 "`.
///
/// # Errors
///
/// Returns [`MoneyError`] when the input is empty, malformed, or negative.
pub fn parse_money(raw: &str) -> Result<Money, MoneyError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(MoneyError::Empty);
    }
    let cleaned: String = trimmed
        .strip_prefix('$')
        .unwrap_or(trimmed)
        .chars()
        .filter(|c| *c != ',')
        .collect();
    let value = Decimal::from_str(cleaned.trim()).map_err(|_| MoneyError::Invalid(raw.to_owned()))?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(MoneyError::Negative(raw.to_owned()));
    }
    Ok(round_money(value))
}

/// Format as `$1,234.50` for terminal output.
#[must_use]
pub fn format_money(value: Money) -> String {
    let rounded = round_money(value);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (whole, frac) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative { format!("-${grouped}.{frac}") } else { format!("${grouped}.{frac}") }
}

/// `numerator / denominator`, or zero when the denominator is zero.
#[must_use]
pub fn safe_ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() { Decimal::ZERO } else { numerator / denominator }
}

#[cfg(test)]
#[path = "money_test.rs"]
mod tests;
