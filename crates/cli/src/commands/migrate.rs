//! Database migration command.
//!
//! Applies the storefront's embedded migrations from
//! `crates/storefront/migrations/`, then creates the session table.

use super::{CliError, connect};

/// Run all migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    forkful_storefront::db::run_migrations(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
