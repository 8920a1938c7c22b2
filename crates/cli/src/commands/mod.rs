//! Command implementations.

pub mod migrate;
pub mod orders;
pub mod seed;
pub mod wallet;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use forkful_storefront::db::{self, MigrationError, RepositoryError};

/// Errors from CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migrations failed.
    #[error(transparent)]
    Migration(#[from] MigrationError),

    /// A query failed or was rejected.
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// The input file could not be read.
    #[error("Could not read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// The input file is not valid YAML for this command.
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An argument was rejected.
    #[error("{0}")]
    Invalid(String),
}

/// Connect to the database named by `FORKFUL_DATABASE_URL` or `DATABASE_URL`.
///
/// Loads `.env` first if present.
pub async fn connect() -> Result<PgPool, CliError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("FORKFUL_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CliError::MissingEnvVar("FORKFUL_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&database_url).await?)
}
