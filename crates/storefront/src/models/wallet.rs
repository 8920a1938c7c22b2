//! Wallet ledger types and top-up rules.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use forkful_core::{Money, OrderId, UserId, WalletTransactionId, WalletTransactionKind};

/// One wallet ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletTransaction {
    pub id: WalletTransactionId,
    #[serde(skip)]
    pub user_id: UserId,
    pub kind: WalletTransactionKind,
    /// Signed: credits are positive, payments negative.
    pub amount: Money,
    pub balance_after: Money,
    pub order_id: Option<OrderId>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Reasons a top-up is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopUpError {
    #[error("The minimum top-up is {minimum}")]
    BelowMinimum { minimum: Money },
    #[error("The maximum top-up is {maximum}")]
    AboveMaximum { maximum: Money },
    #[error("Wallet balance cannot exceed {max_balance}")]
    BalanceLimit { max_balance: Money },
}

/// Bounds on wallet top-ups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletLimits {
    pub min_top_up: Money,
    pub max_top_up: Money,
    pub max_balance: Money,
}

impl Default for WalletLimits {
    fn default() -> Self {
        Self {
            min_top_up: Money::from_minor(500),
            max_top_up: Money::from_minor(50_000),
            max_balance: Money::from_minor(100_000),
        }
    }
}

impl WalletLimits {
    /// Check a top-up of `amount` against a wallet holding `balance`.
    ///
    /// # Errors
    ///
    /// Returns the [`TopUpError`] for the first bound broken.
    pub fn check_top_up(&self, amount: Money, balance: Money) -> Result<(), TopUpError> {
        if amount < self.min_top_up {
            return Err(TopUpError::BelowMinimum {
                minimum: self.min_top_up,
            });
        }
        if amount > self.max_top_up {
            return Err(TopUpError::AboveMaximum {
                maximum: self.max_top_up,
            });
        }
        match balance.checked_add(amount) {
            Some(after) if after <= self.max_balance => Ok(()),
            _ => Err(TopUpError::BalanceLimit {
                max_balance: self.max_balance,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(minor: i64) -> Money {
        Money::from_minor(minor)
    }

    #[test]
    fn test_top_up_bounds() {
        let limits = WalletLimits::default();
        assert_eq!(limits.check_top_up(m(500), Money::ZERO), Ok(()));
        assert_eq!(
            limits.check_top_up(m(499), Money::ZERO),
            Err(TopUpError::BelowMinimum { minimum: m(500) })
        );
        assert_eq!(
            limits.check_top_up(m(50_001), Money::ZERO),
            Err(TopUpError::AboveMaximum { maximum: m(50_000) })
        );
    }

    #[test]
    fn test_top_up_balance_ceiling() {
        let limits = WalletLimits::default();
        assert_eq!(limits.check_top_up(m(10_000), m(90_000)), Ok(()));
        assert_eq!(
            limits.check_top_up(m(10_001), m(90_000)),
            Err(TopUpError::BalanceLimit {
                max_balance: m(100_000)
            })
        );
        assert_eq!(
            TopUpError::BelowMinimum { minimum: m(500) }.to_string(),
            "The minimum top-up is £5.00"
        );
    }
}
