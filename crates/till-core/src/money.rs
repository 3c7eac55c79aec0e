//! # Money
//!
//! Integer-cent amounts for every figure in the ledger.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  A drawer is reconciled by summing hundreds of small amounts.           │
//! │  In binary floating point that sum drifts, and a perfect count shows    │
//! │  a "divergence" of 0.0000001.                                           │
//! │                                                                         │
//! │  Money(i64) holds cents. Sums are exact, and two amounts are "equal"    │
//! │  when |a − b| ≤ 0.009, i.e. exactly when their cents are equal.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use till_core::money::Money;
//!
//! let float = Money::from_cents(10000);
//! let counted: Money = "150,00".parse().unwrap();
//!
//! assert_eq!((counted - float).to_string(), "50.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A signed amount in cents.
///
/// Signed because divergences and ledger deltas are. Serialized as the bare
/// cent count.
///
/// ```text
///  opening float ─────┐
///  sale payments ─────┼──► Balances ──► ClosingBreakdown ◄── DeclaredCount
///  movements ─────────┘               difference = declared − expected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1099).to_string(), "10.99");
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (truncated toward zero).
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(-550).cents_part(), 50);
    /// ```
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Strictly greater than zero.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Clamps negative values to zero.
    ///
    /// ## User Workflow
    /// ```text
    /// Sale: total 80.00, customer hands over 100.00 cash
    ///      │
    ///      ▼
    /// cash received 100.00 - change 20.00 = 80.00 retained
    ///      │
    ///      ▼
    /// floor_at_zero() ← a bad change figure never makes the drawer negative
    /// ```
    #[inline]
    pub const fn floor_at_zero(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            Money(self.0)
        }
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses an amount typed by an operator.
///
/// ## Accepted Forms
/// - `"150"`, `"150.5"`, `"150.00"`, `"-3.25"`
/// - comma as decimal separator: `"150,00"`
///
/// Amounts have at most two significant decimal places. Trailing zeros
/// beyond the cent are accepted (`"150.000"`); any other digit there is
/// rejected, since a drawer never holds a fraction of a cent.
impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Required {
                field: "amount".to_string(),
            });
        }

        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let normalized = digits.replace(',', ".");
        let mut parts = normalized.splitn(2, '.');
        let major_str = parts.next().unwrap_or_default();
        let minor_str = parts.next().unwrap_or_default();

        if major_str.is_empty() && minor_str.is_empty() {
            return Err(invalid("no digits"));
        }
        if !major_str.chars().all(|c| c.is_ascii_digit())
            || !minor_str.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("must be a decimal number"));
        }

        let major: i64 = if major_str.is_empty() {
            0
        } else {
            major_str.parse().map_err(|_| invalid("amount is too large"))?
        };

        if minor_str.chars().skip(2).any(|c| c != '0') {
            return Err(invalid("at most two decimal places"));
        }

        let mut minor_digits = minor_str.chars().take(2).collect::<String>();
        while minor_digits.len() < 2 {
            minor_digits.push('0');
        }
        let minor: i64 = minor_digits
            .parse()
            .map_err(|_| invalid("must be a decimal number"))?;

        let cents = major
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .ok_or_else(|| invalid("amount is too large"))?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Two-decimal representation; round-trips through `FromStr`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.units().abs(), self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.units(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(15000).to_string(), "150.00");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Money::from_cents(0).to_string(), "0.00");
    }

    #[test]
    fn test_parse_accepted_forms() {
        assert_eq!("150".parse::<Money>().unwrap().cents(), 15000);
        assert_eq!("150.5".parse::<Money>().unwrap().cents(), 15050);
        assert_eq!("150.00".parse::<Money>().unwrap().cents(), 15000);
        assert_eq!("150,25".parse::<Money>().unwrap().cents(), 15025);
        assert_eq!("-3.25".parse::<Money>().unwrap().cents(), -325);
        assert_eq!(" 0.01 ".parse::<Money>().unwrap().cents(), 1);
        assert_eq!(".75".parse::<Money>().unwrap().cents(), 75);
    }

    #[test]
    fn test_parse_rejects_fractions_of_a_cent() {
        for text in ["0.009", "150.009", "149.991", "149.995", "-0.009", "150,019"] {
            let err = text.parse::<Money>().unwrap_err();
            assert!(
                matches!(err, ValidationError::InvalidFormat { .. }),
                "{text} should be rejected"
            );
        }
        assert_eq!("150.000".parse::<Money>().unwrap().cents(), 15000);
        assert_eq!("149.990".parse::<Money>().unwrap().cents(), 14999);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!("1.2.3".parse::<Money>().is_err());
        assert!("R$ 10".parse::<Money>().is_err());
        assert!("-".parse::<Money>().is_err());
        assert!("99999999999999999999".parse::<Money>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for cents in [0, 1, 99, 100, 15001, -325, 123456789] {
            let money = Money::from_cents(cents);
            assert_eq!(money.to_string().parse::<Money>().unwrap(), money);
        }
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((-a).cents(), -1000);

        let total: Money = [a, b, b].iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_floor_at_zero() {
        assert_eq!(Money::from_cents(-20).floor_at_zero(), Money::zero());
        assert_eq!(Money::from_cents(8000).floor_at_zero().cents(), 8000);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        assert!(Money::from_cents(100).is_positive());
        assert!(Money::from_cents(-100).is_negative());
        assert_eq!(Money::from_cents(-550).abs().cents(), 550);
    }
}
