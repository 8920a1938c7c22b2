//! Money held as integer minor currency units (pence).
//!
//! All prices, totals, and wallet balances are stored and computed as whole
//! pence to avoid floating-point rounding. Arithmetic is checked; formatting
//! goes through [`rust_decimal::Decimal`] so `1250` renders as `£12.50`.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Symbol used when formatting amounts for customers.
pub const CURRENCY_SYMBOL: &str = "£";

/// An amount of money in minor currency units.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero pence.
    pub const ZERO: Self = Self(0);

    /// Create an amount from minor units (pence).
    #[must_use]
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// The amount in minor units (pence).
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Add two amounts, returning `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Subtract an amount, returning `None` on overflow.
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Multiply by a quantity, returning `None` on overflow.
    #[must_use]
    pub const fn checked_mul(self, quantity: u32) -> Option<Self> {
        match self.0.checked_mul(quantity as i64) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Negated amount (used for ledger debits), or `None` for `i64::MIN` pence.
    #[must_use]
    pub const fn checked_neg(self) -> Option<Self> {
        match self.0.checked_neg() {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// The amount as a two-place decimal in major units (e.g. `12.50`).
    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let major = self.to_decimal().abs();
        if self.is_negative() {
            write!(f, "-{CURRENCY_SYMBOL}{major:.2}")
        } else {
            write!(f, "{CURRENCY_SYMBOL}{major:.2}")
        }
    }
}

impl From<i64> for Money {
    fn from(minor: i64) -> Self {
        Self(minor)
    }
}

impl From<Money> for i64 {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl core::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, m| Self(acc.0.saturating_add(m.0)))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i64 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i64 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let minor = <i64 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(minor))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i64 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_minor(1250).to_string(), "£12.50");
        assert_eq!(Money::from_minor(5).to_string(), "£0.05");
        assert_eq!(Money::ZERO.to_string(), "£0.00");
        assert_eq!(Money::from_minor(-100).to_string(), "-£1.00");
    }

    #[test]
    fn test_checked_arithmetic() {
        let price = Money::from_minor(899);
        assert_eq!(price.checked_mul(3), Some(Money::from_minor(2697)));
        assert_eq!(
            price.checked_add(Money::from_minor(101)),
            Some(Money::from_minor(1000))
        );
        assert_eq!(Money::from_minor(i64::MAX).checked_mul(2), None);
        assert_eq!(Money::from_minor(i64::MIN).checked_sub(Money::from_minor(1)), None);
    }

    #[test]
    fn test_checked_neg() {
        assert_eq!(
            Money::from_minor(1450).checked_neg(),
            Some(Money::from_minor(-1450))
        );
        assert_eq!(Money::from_minor(-1).checked_neg(), Some(Money::from_minor(1)));
        assert_eq!(Money::from_minor(i64::MIN).checked_neg(), None);
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 250, 50].into_iter().map(Money::from_minor).sum();
        assert_eq!(total.minor(), 400);
    }

    #[test]
    fn test_serde_is_minor_units() {
        assert_eq!(serde_json::to_string(&Money::from_minor(299)).unwrap(), "299");
    }
}
