//! Quote pricing.
//!
//! DESIGN
//! ======
//! Every line total is rounded to cents before it is summed, and the fee and
//! tax are each rounded once from the subtotal. The stored total is then a
//! plain sum of already-rounded parts, so `total == subtotal + fee + tax`
//! holds exactly for every quote the service writes.
//!
//! Tax is charged on the subtotal only; the card processing fee is not taxed.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use crate::money::{Money, round_money, round_rate};

/// Default sales tax applied to quotes (8.5 %).
pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(85, 0, 0, false, 3);
/// Default card processing fee (3.5 %), applied only when requested.
pub const DEFAULT_PROCESSING_FEE_RATE: Decimal = Decimal::from_parts(35, 0, 0, false, 3);
/// Largest accepted unit price.
pub const MAX_UNIT_PRICE: Money = Decimal::from_parts(1_000_000, 0, 0, false, 0);
/// Largest accepted line quantity (units or square feet).
pub const MAX_QUANTITY: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);
/// Largest accepted slab dimension, in inches.
pub const MAX_DIMENSION_IN: Decimal = Decimal::from_parts(1_000, 0, 0, false, 0);
/// Square inches per square foot; slab dimensions are measured in inches.
const SQ_INCHES_PER_SQ_FOOT: Decimal = Decimal::from_parts(144, 0, 0, false, 0);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("quantity must not be negative: {0}")]
    NegativeQuantity(Decimal),
    #[error("unit price must not be negative: {0}")]
    NegativePrice(Decimal),
    #[error("slab dimension must be positive: {0}")]
    InvalidDimension(Decimal),
    #[error("rate must be between 0 and 1: {0}")]
    InvalidRate(Decimal),
    #[error("{field} exceeds the maximum of {max}: {value}")]
    TooLarge { field: &'static str, value: Decimal, max: Decimal },
    #[error("amount is too large to price")]
    Overflow,
}

fn require_at_most(value: Decimal, max: Decimal, field: &'static str) -> Result<Decimal, PricingError> {
    if value > max {
        return Err(PricingError::TooLarge { field, value, max });
    }
    Ok(value)
}

fn checked_sum(parts: &[Money]) -> Result<Money, PricingError> {
    parts
        .iter()
        .try_fold(Decimal::ZERO, |acc, part| acc.checked_add(*part))
        .ok_or(PricingError::Overflow)
}

/// Rates applied on top of the line-item subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    pub tax_rate: Decimal,
    pub processing_fee_rate: Decimal,
}

impl PricingPolicy {
    /// Build a policy, validating both rates fall in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidRate`] for a rate outside `[0, 1]`.
    pub fn new(tax_rate: Decimal, processing_fee_rate: Decimal) -> Result<Self, PricingError> {
        for rate in [tax_rate, processing_fee_rate] {
            if rate.is_sign_negative() || rate > Decimal::ONE {
                return Err(PricingError::InvalidRate(rate));
            }
        }
        Ok(Self { tax_rate: round_rate(tax_rate), processing_fee_rate: round_rate(processing_fee_rate) })
    }

    /// Same policy with a per-quote tax rate override.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidRate`] for a rate outside `[0, 1]`.
    pub fn with_tax_rate(self, tax_rate: Decimal) -> Result<Self, PricingError> {
        Self::new(tax_rate, self.processing_fee_rate)
    }
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self { tax_rate: DEFAULT_TAX_RATE, processing_fee_rate: DEFAULT_PROCESSING_FEE_RATE }
    }
}

/// Minimal line shape the calculator needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineInput {
    pub quantity: Decimal,
    pub unit_price: Money,
}

/// Computed money fields stored on a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuoteTotals {
    pub subtotal: Money,
    pub processing_fee: Money,
    pub tax_amount: Money,
    pub total: Money,
}

impl QuoteTotals {
    /// True when the stored parts add up to the stored total.
    #[must_use]
    pub fn verify(&self) -> bool {
        self.subtotal + self.processing_fee + self.tax_amount == self.total
    }
}

/// `quantity × unit_price`, rounded to cents.
///
/// # Errors
///
/// Returns an error when either input is negative or above
/// [`MAX_QUANTITY`] / [`MAX_UNIT_PRICE`].
pub fn line_total(quantity: Decimal, unit_price: Money) -> Result<Money, PricingError> {
    if quantity.is_sign_negative() && !quantity.is_zero() {
        return Err(PricingError::NegativeQuantity(quantity));
    }
    if unit_price.is_sign_negative() && !unit_price.is_zero() {
        return Err(PricingError::NegativePrice(unit_price));
    }
    require_at_most(quantity, MAX_QUANTITY, "quantity")?;
    require_at_most(unit_price, MAX_UNIT_PRICE, "unit price")?;
    quantity.checked_mul(unit_price).map(round_money).ok_or(PricingError::Overflow)
}

/// Area in square feet of a slab measured in inches.
///
/// # Errors
///
/// Returns [`PricingError::InvalidDimension`] for a non-positive dimension and
/// [`PricingError::TooLarge`] above [`MAX_DIMENSION_IN`].
pub fn slab_area_sqft(length_in: Decimal, width_in: Decimal) -> Result<Decimal, PricingError> {
    for dim in [length_in, width_in] {
        if dim <= Decimal::ZERO {
            return Err(PricingError::InvalidDimension(dim));
        }
        require_at_most(dim, MAX_DIMENSION_IN, "slab dimension")?;
    }
    length_in
        .checked_mul(width_in)
        .map(|sq_in| round_money(sq_in / SQ_INCHES_PER_SQ_FOOT))
        .ok_or(PricingError::Overflow)
}

/// Price a set of lines under `policy`.
///
/// # Errors
///
/// Propagates the first invalid line.
pub fn compute_totals(
    lines: &[LineInput],
    apply_processing_fee: bool,
    policy: PricingPolicy,
) -> Result<QuoteTotals, PricingError> {
    let line_totals =
        lines.iter().map(|line| line_total(line.quantity, line.unit_price)).collect::<Result<Vec<_>, _>>()?;
    let subtotal = checked_sum(&line_totals)?;

    let apply_rate = |rate: Decimal| subtotal.checked_mul(rate).map(round_money).ok_or(PricingError::Overflow);
    let processing_fee = if apply_processing_fee { apply_rate(policy.processing_fee_rate)? } else { Decimal::ZERO };
    let tax_amount = apply_rate(policy.tax_rate)?;
    let total = checked_sum(&[subtotal, processing_fee, tax_amount])?;

    Ok(QuoteTotals { subtotal, processing_fee, tax_amount, total })
}

#[cfg(test)]
#[path = "pricing_test.rs"]
mod tests;
