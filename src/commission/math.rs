//! Exact fixed-scale decimal arithmetic.
//!
//! Every operation truncates its result toward zero at the configured scale,
//! so chained intermediate results never carry more digits than the engine
//! was configured with. Rounding to a currency precision happens separately
//! through [`DecimalMath::ceiling`].
use std::cmp::Ordering;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::commission::CommissionError;

/// Largest scale a [`Decimal`] can represent.
pub const MAX_SCALE: u32 = 28;

/// Decimal arithmetic with a fixed output scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalMath {
    scale: u32,
}

impl DecimalMath {
    /// Creates a new instance retaining `scale` fractional digits.
    pub fn new(scale: u32) -> Result<Self, CommissionError> {
        if scale > MAX_SCALE {
            return Err(CommissionError::InvalidPrecision(scale));
        }
        Ok(DecimalMath { scale })
    }

    /// Gets the configured scale.
    pub fn scale(&self) -> u32 {
        self.scale
    }

    fn truncate(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(self.scale, RoundingStrategy::ToZero)
    }

    /// Adds `right` to `left`.
    pub fn add(&self, left: Decimal, right: Decimal) -> Result<Decimal, CommissionError> {
        left.checked_add(right)
            .map(|v| self.truncate(v))
            .ok_or(CommissionError::Overflow)
    }

    /// Subtracts `right` from `left`.
    pub fn subtract(&self, left: Decimal, right: Decimal) -> Result<Decimal, CommissionError> {
        left.checked_sub(right)
            .map(|v| self.truncate(v))
            .ok_or(CommissionError::Overflow)
    }

    /// Multiplies `left` by `right`.
    pub fn multiply(&self, left: Decimal, right: Decimal) -> Result<Decimal, CommissionError> {
        left.checked_mul(right)
            .map(|v| self.truncate(v))
            .ok_or(CommissionError::Overflow)
    }

    /// Divides `left` by `right`. Fails if `right` is zero.
    pub fn divide(&self, left: Decimal, right: Decimal) -> Result<Decimal, CommissionError> {
        if right.is_zero() {
            return Err(CommissionError::DivisionByZero);
        }
        left.checked_div(right)
            .map(|v| self.truncate(v))
            .ok_or(CommissionError::Overflow)
    }

    /// Compares two values as seen at the configured scale.
    /// Values that only differ beyond the scale are equal.
    pub fn compare(&self, left: Decimal, right: Decimal) -> Ordering {
        self.truncate(left).cmp(&self.truncate(right))
    }

    /// Rounds `value` toward positive infinity at `precision` fractional
    /// digits and formats it with exactly that many digits.
    pub fn ceiling(&self, value: Decimal, precision: u32) -> Result<String, CommissionError> {
        if precision > MAX_SCALE {
            return Err(CommissionError::InvalidPrecision(precision));
        }
        let mut rounded =
            value.round_dp_with_strategy(precision, RoundingStrategy::ToPositiveInfinity);
        rounded.rescale(precision);
        if rounded.is_zero() {
            rounded.set_sign_positive(true);
        }
        Ok(rounded.to_string())
    }
}
