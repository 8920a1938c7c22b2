//! Database operations for the Forkful `PostgreSQL` store.
//!
//! ## Tables
//!
//! - `users`, `user_passwords` - Customer accounts and password hashes
//! - `menu_items` - Dishes
//! - `addresses` - Saved delivery addresses (one default per user)
//! - `orders`, `order_items` - Placed orders with priced line snapshots
//! - `notifications` - In-app inbox
//! - `wallet_transactions` - Wallet ledger
//! - `tower_sessions.session` - Session storage (created by the session store)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/`, embedded at
//! build time, and run explicitly via:
//! ```bash
//! forkful migrate
//! ```

pub mod addresses;
pub mod menu;
pub mod notifications;
pub mod orders;
pub mod users;
pub mod wallet;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A wallet debit would take the balance below zero.
    #[error("insufficient wallet balance")]
    InsufficientFunds,
}

/// Errors from [`run_migrations`].
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("schema migration failed: {0}")]
    Schema(#[from] MigrateError),
    #[error("session store migration failed: {0}")]
    SessionStore(#[from] sqlx::Error),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Apply schema migrations, then create the session table.
///
/// # Errors
///
/// Returns `MigrationError` if either step fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrationError> {
    MIGRATOR.run(pool).await?;
    PostgresStore::new(pool.clone()).migrate().await?;
    Ok(())
}

/// Map a unique violation to [`RepositoryError::Conflict`].
pub(crate) fn conflict_on_unique(err: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(err)
}

/// Convert a stored quantity, rejecting values that cannot be a quantity.
pub(crate) fn quantity_from_db(raw: i32) -> Result<u32, RepositoryError> {
    u32::try_from(raw)
        .ok()
        .filter(|q| *q > 0)
        .ok_or_else(|| RepositoryError::DataCorruption(format!("invalid quantity: {raw}")))
}

/// Convert a quantity for binding.
pub(crate) fn quantity_to_db(quantity: u32) -> i32 {
    i32::try_from(quantity).unwrap_or(i32::MAX)
}

