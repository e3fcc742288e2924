//! Quantity value object for order and position sizes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};

use crate::domain::shared::DomainError;

/// A share quantity.
///
/// Represented as a Decimal to handle fractional fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(Decimal);

impl Quantity {
    /// Create a new Quantity from a Decimal.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a Quantity from an integer.
    #[must_use]
    pub fn from_i64(amount: i64) -> Self {
        Self(Decimal::new(amount, 0))
    }

    /// Zero quantity.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Get the inner Decimal value.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if this quantity is positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns true if this quantity is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == Decimal::ZERO
    }

    /// The smaller of two quantities.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        if self.0 <= other.0 { self } else { other }
    }

    /// Validate quantity for order submission.
    ///
    /// # Errors
    ///
    /// Returns error if quantity is zero or negative.
    pub fn validate_for_order(&self) -> Result<(), DomainError> {
        if self.0 <= Decimal::ZERO {
            return Err(DomainError::InvalidValue {
                field: "quantity".to_string(),
                message: "Order quantity must be positive".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract().is_zero() {
            write!(f, "{}", self.0.trunc())
        } else {
            write!(f, "{:.4}", self.0)
        }
    }
}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Quantity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl Add for Quantity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Quantity {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl From<Decimal> for Quantity {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<i64> for Quantity {
    fn from(value: i64) -> Self {
        Self::from_i64(value)
    }
}

impl From<Quantity> for Decimal {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn quantity_new_and_display() {
        let q = Quantity::from_i64(100);
        assert_eq!(format!("{q}"), "100");
    }

    #[test]
    fn quantity_fractional_display() {
        let q = Quantity::new(dec!(100.5));
        assert_eq!(format!("{q}"), "100.5000");
    }

    #[test]
    fn quantity_zero() {
        assert!(Quantity::ZERO.is_zero());
        assert!(!Quantity::ZERO.is_positive());
    }

    #[test]
    fn quantity_min() {
        let a = Quantity::from_i64(100);
        let b = Quantity::from_i64(30);
        assert_eq!(a.min(b), b);
        assert_eq!(b.min(a), b);
    }

    #[test]
    fn quantity_arithmetic() {
        let a = Quantity::from_i64(100);
        let b = Quantity::from_i64(30);

        assert_eq!(a + b, Quantity::from_i64(130));
        assert_eq!(a - b, Quantity::from_i64(70));
    }

    #[test]
    fn quantity_ordering() {
        assert!(Quantity::from_i64(100) > Quantity::from_i64(50));
    }

    #[test]
    fn quantity_validate_for_order() {
        assert!(Quantity::ZERO.validate_for_order().is_err());
        assert!(Quantity::from_i64(-10).validate_for_order().is_err());
        assert!(Quantity::from_i64(100).validate_for_order().is_ok());
    }

    #[test]
    fn quantity_serde_roundtrip() {
        let q = Quantity::new(dec!(10.5));
        let json = serde_json::to_string(&q).unwrap();
        let parsed: Quantity = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, q);
    }

    #[test]
    fn quantity_conversions() {
        let q: Quantity = 100i64.into();
        assert_eq!(q, Quantity::from_i64(100));

        let d: Decimal = q.into();
        assert_eq!(d, dec!(100));
    }

    #[test]
    fn quantity_default() {
        assert!(Quantity::default().is_zero());
    }
}
