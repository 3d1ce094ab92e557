//! Money value object.
//!
//! All monetary values are stored as integer cents (never floats), so
//! ledger sums and reconciliation deltas are exact.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};

/// Monetary amount in integer cents.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates an amount from integer cents.
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Zero amount.
    pub fn zero() -> Self {
        Self(0)
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the absolute value.
    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_cents_preserves_value() {
        assert_eq!(Money::from_cents(999).cents(), 999);
    }

    #[test]
    fn arithmetic_works_in_cents() {
        let a = Money::from_cents(100_000);
        let b = Money::from_cents(105_000);

        assert_eq!((b - a).cents(), 5_000);
        assert_eq!((a + b).cents(), 205_000);
        assert_eq!((-a).cents(), -100_000);
    }

    #[test]
    fn abs_removes_sign() {
        assert_eq!(Money::from_cents(-5_000).abs(), Money::from_cents(5_000));
    }

    #[test]
    fn display_formats_as_decimal() {
        assert_eq!(format!("{}", Money::from_cents(100_000)), "1000.00");
        assert_eq!(format!("{}", Money::from_cents(5)), "0.05");
        assert_eq!(format!("{}", Money::from_cents(-5_050)), "-50.50");
    }

    #[test]
    fn serializes_as_plain_integer() {
        let json = serde_json::to_string(&Money::from_cents(1234)).unwrap();
        assert_eq!(json, "1234");
    }
}
