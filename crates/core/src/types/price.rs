//! Type-safe price representation using decimal arithmetic.
//!
//! Prices come from the catalog as plain JSON numbers in a single unit
//! currency. They are held as [`Decimal`] so that cart totals never pick up
//! floating point drift (`10.99 * 2` is exactly `21.98`).

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A unit-currency price.
///
/// Serializes as a JSON number. Deserialization accepts numbers and numeric
/// strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(serialize_with = "rust_decimal::serde::float::serialize")] Decimal);

impl Price {
    /// A zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from a whole number of cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Whether the amount is strictly above zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self::Output {
        Self(self.0 * Decimal::from(quantity))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        assert_eq!(Price::from_cents(1099).amount(), Decimal::new(1099, 2));
        assert_eq!(Price::from_cents(-250).amount(), Decimal::new(-250, 2));
    }

    #[test]
    fn test_multiplication_is_exact() {
        assert_eq!(Price::from_cents(1099) * 2, Price::from_cents(2198));
        assert_eq!(Price::from_cents(2500) * 3, Price::from_cents(7500));
    }

    #[test]
    fn test_sum() {
        let total: Price = [Price::from_cents(100), Price::from_cents(250)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_cents(350));
        assert_eq!(core::iter::empty::<Price>().sum::<Price>(), Price::ZERO);
    }

    #[test]
    fn test_sign_checks() {
        assert!(Price::from_cents(-1).is_negative());
        assert!(!Price::ZERO.is_negative());
        assert!(!Price::ZERO.is_positive());
        assert!(Price::from_cents(1).is_positive());
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::from_cents(2198).to_string(), "$21.98");
        assert_eq!(Price::new(Decimal::from(25)).to_string(), "$25.00");
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_string(&Price::from_cents(1099)).unwrap();
        assert_eq!(json, "10.99");
    }

    #[test]
    fn test_deserializes_numbers_and_strings() {
        let from_float: Price = serde_json::from_str("10.99").unwrap();
        assert_eq!(from_float, Price::from_cents(1099));

        let from_int: Price = serde_json::from_str("25").unwrap();
        assert_eq!(from_int, Price::from_cents(2500));

        let from_str: Price = serde_json::from_str("\"7.50\"").unwrap();
        assert_eq!(from_str, Price::from_cents(750));
    }
}
