//! Lossless decimal numeric type backed by rust_decimal.
//!
//! Every raw ledger amount, price, index and rate flows through this type. Raw
//! integer amounts are scaled by per-coin decimal counts with [`Decimal::shift`]
//! instead of floating-point division.

use rust_decimal::{Decimal as RustDecimal, MathematicalOps, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Denominator of a Move `FixedPoint32` value (2^32).
const FIXED_POINT32_DENOMINATOR: u64 = 1 << 32;

/// Lossless decimal numeric type for financial calculations.
///
/// Serializes to a JSON string so precision survives transport.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Decimal(#[serde(with = "rust_decimal::serde::str")] RustDecimal);

impl Decimal {
    /// Create a Decimal from a RustDecimal.
    pub fn new(value: RustDecimal) -> Self {
        Decimal(value)
    }

    /// Parse a Decimal from a string losslessly.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        RustDecimal::from_str(s).map(Decimal)
    }

    /// Format the Decimal as a canonical string (no exponent notation).
    pub fn to_canonical_string(&self) -> String {
        let normalized = self.0.normalize();
        format!("{}", normalized)
    }

    /// Get the underlying RustDecimal.
    pub fn inner(&self) -> RustDecimal {
        self.0
    }

    /// Largest representable value.
    pub fn max_value() -> Self {
        Decimal(RustDecimal::MAX)
    }

    /// The additive identity (0).
    pub fn zero() -> Self {
        Decimal(RustDecimal::ZERO)
    }

    /// The multiplicative identity (1).
    pub fn one() -> Self {
        Decimal(RustDecimal::ONE)
    }

    /// Returns the value 100.
    pub fn hundred() -> Self {
        Decimal(RustDecimal::ONE_HUNDRED)
    }

    /// Decode a Move `FixedPoint32` raw value (`raw / 2^32`).
    pub fn from_fixed_point32(raw: u64) -> Self {
        Decimal(RustDecimal::from(raw) / RustDecimal::from(FIXED_POINT32_DENOMINATOR))
    }

    /// Returns true if the value is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the value is > 0.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    /// Returns true if the value is < 0.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    /// Absolute value.
    pub fn abs(&self) -> Self {
        Decimal(self.0.abs())
    }

    /// Multiply by `10^exp`.
    ///
    /// `shift(-9)` turns a raw amount of a 9-decimal coin into whole coins,
    /// `shift(9)` goes the other way. Saturates at the representable range;
    /// use [`Decimal::checked_shift`] where an overflow must be told apart.
    pub fn shift(&self, exp: i32) -> Self {
        self.checked_shift(exp).unwrap_or_else(|| {
            if self.is_negative() {
                Decimal(RustDecimal::MIN)
            } else {
                Decimal::max_value()
            }
        })
    }

    /// Multiply by `10^exp`, `None` on overflow. Negative exponents never
    /// overflow; digits below the 28th decimal place are rounded away.
    pub fn checked_shift(&self, exp: i32) -> Option<Self> {
        let mut value = self.0;
        let mut remaining = exp.unsigned_abs();
        while remaining > 0 {
            let step = remaining.min(MAX_POW10);
            let factor = pow10(step)?;
            value = if exp >= 0 {
                value.checked_mul(factor)?
            } else {
                value.checked_div(factor).unwrap_or(RustDecimal::ZERO)
            };
            remaining -= step;
        }
        Some(Decimal(value))
    }

    /// Division returning `None` on a zero divisor or overflow.
    pub fn checked_div(&self, rhs: Decimal) -> Option<Decimal> {
        self.0.checked_div(rhs.0).map(Decimal)
    }

    /// Multiplication clamped to the representable range.
    pub fn saturating_mul(&self, rhs: Decimal) -> Decimal {
        Decimal(self.0.saturating_mul(rhs.0))
    }

    /// Multiplication returning `None` on overflow.
    pub fn checked_mul(&self, rhs: Decimal) -> Option<Decimal> {
        self.0.checked_mul(rhs.0).map(Decimal)
    }

    /// Compute `self * numerator / denominator`, multiplying first so that
    /// exact quotients stay exact. Falls back to divide-first when the
    /// intermediate product would overflow.
    pub fn mul_div(&self, numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
        match self.checked_mul(numerator) {
            Some(product) => product.checked_div(denominator),
            None => self
                .checked_div(denominator)
                .and_then(|q| q.checked_mul(numerator)),
        }
    }

    /// Integer power, `None` on overflow.
    pub fn checked_powu(&self, exp: u64) -> Option<Decimal> {
        self.0.checked_powu(exp).map(Decimal)
    }

    /// Smaller of two values.
    pub fn min(self, other: Decimal) -> Decimal {
        Ord::min(self, other)
    }

    /// Larger of two values.
    pub fn max(self, other: Decimal) -> Decimal {
        Ord::max(self, other)
    }

    /// `max(self, 0)`.
    pub fn floor_at_zero(self) -> Decimal {
        self.max(Decimal::zero())
    }

    /// Round toward negative infinity to an integer.
    pub fn floor(&self) -> Decimal {
        Decimal(self.0.floor())
    }

    /// Round toward zero at `dp` decimal places.
    pub fn round_down(&self, dp: u32) -> Decimal {
        Decimal(self.0.round_dp_with_strategy(dp, RoundingStrategy::ToZero))
    }

    /// Number of digits in the integer part of `|self|` (at least 1).
    pub fn integer_digits(&self) -> u32 {
        let mut whole = self.0.abs().trunc();
        let mut digits = 1;
        while whole >= RustDecimal::TEN {
            whole = (whole / RustDecimal::TEN).trunc();
            digits += 1;
        }
        digits
    }

}

/// Largest power of ten a `rust_decimal` can hold.
const MAX_POW10: u32 = 28;

fn pow10(exp: u32) -> Option<RustDecimal> {
    let mut value = RustDecimal::ONE;
    for _ in 0..exp {
        value = value.checked_mul(RustDecimal::TEN)?;
    }
    Some(value)
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Decimal {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<RustDecimal> for Decimal {
    fn from(value: RustDecimal) -> Self {
        Decimal(value)
    }
}

impl From<Decimal> for RustDecimal {
    fn from(value: Decimal) -> Self {
        value.0
    }
}

impl From<u64> for Decimal {
    fn from(value: u64) -> Self {
        Decimal(RustDecimal::from(value))
    }
}

impl From<u32> for Decimal {
    fn from(value: u32) -> Self {
        Decimal(RustDecimal::from(value))
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Decimal(RustDecimal::from(value))
    }
}

// Arithmetic operations
impl std::ops::Add for Decimal {
    type Output = Decimal;

    fn add(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for Decimal {
    fn add_assign(&mut self, rhs: Decimal) {
        self.0 += rhs.0;
    }
}

impl std::ops::Sub for Decimal {
    type Output = Decimal;

    fn sub(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 - rhs.0)
    }
}

impl std::ops::Mul for Decimal {
    type Output = Decimal;

    fn mul(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 * rhs.0)
    }
}

impl std::ops::Div for Decimal {
    type Output = Decimal;

    fn div(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 / rhs.0)
    }
}

impl std::ops::Neg for Decimal {
    type Output = Decimal;

    fn neg(self) -> Decimal {
        Decimal(-self.0)
    }
}

impl std::iter::Sum for Decimal {
    fn sum<I: Iterator<Item = Decimal>>(iter: I) -> Decimal {
        iter.fold(Decimal::zero(), |acc, d| acc + d)
    }
}
