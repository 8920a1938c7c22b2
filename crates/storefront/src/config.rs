//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FORKFUL_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `FORKFUL_BASE_URL` - Public URL of the API; `https` enables secure cookies
//!
//! ## Optional
//! - `FORKFUL_HOST` - Bind address (default: 127.0.0.1)
//! - `FORKFUL_PORT` - Listen port (default: 3000)
//! - `FORKFUL_MENU_CACHE_TTL_SECS` - Menu cache lifetime (default: 60)
//! - `FORKFUL_DELIVERY_FEE` - Delivery fee in pence (default: 299)
//! - `FORKFUL_FREE_DELIVERY_THRESHOLD` - Subtotal for free delivery in pence (default: 2500, 0 disables)
//! - `FORKFUL_MINIMUM_ORDER` - Minimum subtotal in pence (default: 1000)
//! - `FORKFUL_WALLET_MIN_TOP_UP` - Smallest top-up in pence (default: 500)
//! - `FORKFUL_WALLET_MAX_TOP_UP` - Largest top-up in pence (default: 50000)
//! - `FORKFUL_WALLET_MAX_BALANCE` - Wallet balance ceiling in pence (default: 100000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance trace sample rate (default: 0.0)

use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use forkful_core::{DeliveryPolicy, Money};

use crate::models::wallet::WalletLimits;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL
    pub base_url: Url,
    /// How long the menu stays cached
    pub menu_cache_ttl: Duration,
    /// Delivery fee, free delivery threshold, and minimum order
    pub delivery: DeliveryPolicy,
    /// Wallet top-up bounds
    pub wallet: WalletLimits,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. `production`, `staging`)
    pub sentry_environment: Option<String>,
    /// Fraction of error events sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or any value
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let database_url = env
            .get("FORKFUL_DATABASE_URL")
            .or_else(|| env.get("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("FORKFUL_DATABASE_URL".to_string()))?;

        let host = env.parse_or("FORKFUL_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = env.parse_or("FORKFUL_PORT", 3000_u16)?;

        let base_url = env.required("FORKFUL_BASE_URL")?;
        let base_url = Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("FORKFUL_BASE_URL".to_string(), e.to_string())
        })?;

        let menu_cache_ttl =
            Duration::from_secs(env.parse_or("FORKFUL_MENU_CACHE_TTL_SECS", 60_u64)?);

        let delivery = DeliveryPolicy {
            delivery_fee: env.money_or("FORKFUL_DELIVERY_FEE", 299)?,
            free_delivery_threshold: Some(env.money_or("FORKFUL_FREE_DELIVERY_THRESHOLD", 2500)?)
                .filter(|threshold| !threshold.is_zero()),
            minimum_order: env.money_or("FORKFUL_MINIMUM_ORDER", 1000)?,
        };

        let wallet = WalletLimits {
            min_top_up: env.money_or("FORKFUL_WALLET_MIN_TOP_UP", 500)?,
            max_top_up: env.money_or("FORKFUL_WALLET_MAX_TOP_UP", 50_000)?,
            max_balance: env.money_or("FORKFUL_WALLET_MAX_BALANCE", 100_000)?,
        };
        validate_wallet_limits(&wallet)?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            menu_cache_ttl,
            delivery,
            wallet,
            sentry_dsn: env.get("SENTRY_DSN"),
            sentry_environment: env.get("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env.rate_or("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: env.rate_or("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the public URL is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable source with typed accessors.
struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get a variable, treating empty values as unset.
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.get(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }

    /// Parse a non-negative amount in pence.
    fn money_or(&self, key: &str, default: i64) -> Result<Money, ConfigError> {
        let minor = self.parse_or(key, default)?;
        if minor < 0 {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                "must not be negative".to_string(),
            ));
        }
        Ok(Money::from_minor(minor))
    }

    /// Parse a sample rate between 0.0 and 1.0.
    fn rate_or(&self, key: &str, default: f32) -> Result<f32, ConfigError> {
        let rate = self.parse_or(key, default)?;
        if !(0.0..=1.0).contains(&rate) {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("must be between 0.0 and 1.0 (got {rate})"),
            ));
        }
        Ok(rate)
    }
}

/// Check that wallet limits are ordered sensibly.
fn validate_wallet_limits(limits: &WalletLimits) -> Result<(), ConfigError> {
    if limits.min_top_up.is_zero() {
        return Err(ConfigError::InvalidEnvVar(
            "FORKFUL_WALLET_MIN_TOP_UP".to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    if limits.min_top_up > limits.max_top_up {
        return Err(ConfigError::InvalidEnvVar(
            "FORKFUL_WALLET_MAX_TOP_UP".to_string(),
            format!("must be at least the minimum top-up ({})", limits.min_top_up),
        ));
    }
    if limits.max_top_up > limits.max_balance {
        return Err(ConfigError::InvalidEnvVar(
            "FORKFUL_WALLET_MAX_BALANCE".to_string(),
            format!("must be at least the maximum top-up ({})", limits.max_top_up),
        ));
    }
    Ok(())
}
