//! Prepaid wallet: balance, ledger, and top-ups.

use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;

use forkful_core::{Money, UserId};

use crate::db::RepositoryError;
use crate::db::wallet::WalletRepository;
use crate::error::{AppError, Result};
use crate::models::{NewNotification, TopUpError, WalletLimits, WalletTransaction};
use crate::services::notifications::NotificationService;
use crate::validation::clamp_limit;

/// Default ledger page size.
pub const DEFAULT_LIMIT: u32 = 20;

/// Largest ledger page size.
pub const MAX_LIMIT: u32 = 100;

/// Balance plus the limits a top-up form needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WalletSummary {
    pub balance: Money,
    pub min_top_up: Money,
    pub max_top_up: Money,
    pub max_balance: Money,
}

/// Wallet service.
pub struct WalletService<'a> {
    pool: &'a PgPool,
    wallet: WalletRepository<'a>,
    limits: WalletLimits,
}

impl<'a> WalletService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, limits: WalletLimits) -> Self {
        Self {
            pool,
            wallet: WalletRepository::new(pool),
            limits,
        }
    }

    /// Current balance and top-up limits.
    ///
    /// # Errors
    ///
    /// Returns an error if the balance cannot be read.
    pub async fn summary(&self, user_id: UserId) -> Result<WalletSummary> {
        let balance = self.wallet.balance(user_id).await?;
        Ok(WalletSummary {
            balance,
            min_top_up: self.limits.min_top_up,
            max_top_up: self.limits.max_top_up,
            max_balance: self.limits.max_balance,
        })
    }

    /// Ledger entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn transactions(
        &self,
        user_id: UserId,
        limit: Option<u32>,
    ) -> Result<Vec<WalletTransaction>> {
        let limit = clamp_limit(limit, DEFAULT_LIMIT, MAX_LIMIT);
        Ok(self.wallet.transactions(user_id, limit).await?)
    }

    /// Add funds to the wallet.
    ///
    /// Card capture is outside this system; the amount is credited as given.
    ///
    /// # Errors
    ///
    /// Returns `AppError::TopUp` if the amount is outside the configured
    /// bounds or would take the balance over the maximum.
    #[instrument(skip(self))]
    pub async fn top_up(&self, user_id: UserId, amount: Money) -> Result<WalletTransaction> {
        let balance = self.wallet.balance(user_id).await?;
        self.limits.check_top_up(amount, balance)?;

        // The balance may have moved since it was read; the repository
        // re-checks the ceiling atomically.
        let transaction = self
            .wallet
            .credit(user_id, amount, Some(self.limits.max_balance), "Wallet top-up")
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => TopUpError::BalanceLimit {
                    max_balance: self.limits.max_balance,
                }
                .into(),
                other => AppError::from(other),
            })?;

        tracing::info!(amount = %amount, balance = %transaction.balance_after, "Wallet topped up");

        NotificationService::new(self.pool)
            .notify_best_effort(
                user_id,
                &NewNotification::wallet_credited(amount, transaction.balance_after),
            )
            .await;

        Ok(transaction)
    }
}
