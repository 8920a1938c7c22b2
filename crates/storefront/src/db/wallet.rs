//! Wallet repository.
//!
//! The balance lives on `users.wallet_balance` (with a `CHECK >= 0`); every
//! change also appends a row to `wallet_transactions` in the same
//! transaction.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use forkful_core::{Money, OrderId, UserId, WalletTransactionId, WalletTransactionKind};

use super::RepositoryError;
use crate::models::wallet::WalletTransaction;

#[derive(sqlx::FromRow)]
struct WalletTransactionRow {
    id: WalletTransactionId,
    user_id: UserId,
    kind: WalletTransactionKind,
    amount: Money,
    balance_after: Money,
    order_id: Option<OrderId>,
    description: String,
    created_at: DateTime<Utc>,
}

impl From<WalletTransactionRow> for WalletTransaction {
    fn from(row: WalletTransactionRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            kind: row.kind,
            amount: row.amount,
            balance_after: row.balance_after,
            order_id: row.order_id,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

/// A ledger row to append.
pub(crate) struct LedgerEntry<'e> {
    pub user_id: UserId,
    pub kind: WalletTransactionKind,
    pub amount: Money,
    pub balance_after: Money,
    pub order_id: Option<OrderId>,
    pub description: &'e str,
}

/// Repository for wallet balances and the ledger.
pub struct WalletRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WalletRepository<'a> {
    /// Create a new wallet repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Current balance.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn balance(&self, user_id: UserId) -> Result<Money, RepositoryError> {
        sqlx::query_scalar::<_, Money>("SELECT wallet_balance FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Most recent ledger rows, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn transactions(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<WalletTransaction>, RepositoryError> {
        let rows = sqlx::query_as::<_, WalletTransactionRow>(
            r"
            SELECT id, user_id, kind, amount, balance_after, order_id, description, created_at
            FROM wallet_transactions
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            ",
        )
        .bind(user_id)
        .bind(i64::from(limit))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(WalletTransaction::from).collect())
    }

    /// Add `amount` to the wallet and record it.
    ///
    /// With `max_balance`, the credit is refused if the new balance would
    /// exceed it; the check runs in the same statement as the update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist and
    /// `RepositoryError::Conflict` if `max_balance` would be exceeded.
    pub async fn credit(
        &self,
        user_id: UserId,
        amount: Money,
        max_balance: Option<Money>,
        description: &str,
    ) -> Result<WalletTransaction, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let balance_after = sqlx::query_scalar::<_, Money>(
            r"
            UPDATE users
            SET wallet_balance = wallet_balance + $2, updated_at = NOW()
            WHERE id = $1 AND ($3::BIGINT IS NULL OR wallet_balance + $2 <= $3)
            RETURNING wallet_balance
            ",
        )
        .bind(user_id)
        .bind(amount)
        .bind(max_balance)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(balance_after) = balance_after else {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
                    .bind(user_id)
                    .fetch_one(&mut *tx)
                    .await?;
            return Err(if exists {
                RepositoryError::Conflict("wallet balance limit reached".to_owned())
            } else {
                RepositoryError::NotFound
            });
        };

        let transaction = record(
            &mut tx,
            &LedgerEntry {
                user_id,
                kind: WalletTransactionKind::TopUp,
                amount,
                balance_after,
                order_id: None,
                description,
            },
        )
        .await?;

        tx.commit().await?;

        Ok(transaction)
    }
}

/// Subtract `amount` from the balance inside a transaction.
///
/// # Errors
///
/// Returns `RepositoryError::InsufficientFunds` if the balance is too low.
pub(crate) async fn debit(
    conn: &mut PgConnection,
    user_id: UserId,
    amount: Money,
) -> Result<Money, RepositoryError> {
    sqlx::query_scalar::<_, Money>(
        r"
        UPDATE users
        SET wallet_balance = wallet_balance - $2, updated_at = NOW()
        WHERE id = $1 AND wallet_balance >= $2
        RETURNING wallet_balance
        ",
    )
    .bind(user_id)
    .bind(amount)
    .fetch_optional(conn)
    .await?
    .ok_or(RepositoryError::InsufficientFunds)
}

/// Add `amount` to the balance inside a transaction, without a ceiling.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the user doesn't exist.
pub(crate) async fn refund(
    conn: &mut PgConnection,
    user_id: UserId,
    amount: Money,
) -> Result<Money, RepositoryError> {
    sqlx::query_scalar::<_, Money>(
        r"
        UPDATE users
        SET wallet_balance = wallet_balance + $2, updated_at = NOW()
        WHERE id = $1
        RETURNING wallet_balance
        ",
    )
    .bind(user_id)
    .bind(amount)
    .fetch_optional(conn)
    .await?
    .ok_or(RepositoryError::NotFound)
}

/// Append a ledger row.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub(crate) async fn record(
    conn: &mut PgConnection,
    entry: &LedgerEntry<'_>,
) -> Result<WalletTransaction, RepositoryError> {
    let row = sqlx::query_as::<_, WalletTransactionRow>(
        r"
        INSERT INTO wallet_transactions
            (user_id, kind, amount, balance_after, order_id, description)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, user_id, kind, amount, balance_after, order_id, description, created_at
        ",
    )
    .bind(entry.user_id)
    .bind(entry.kind)
    .bind(entry.amount)
    .bind(entry.balance_after)
    .bind(entry.order_id)
    .bind(entry.description)
    .fetch_one(conn)
    .await?;

    Ok(row.into())
}
