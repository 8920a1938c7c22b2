//! Integration tests for Forkful.
//!
//! The tests exercise the public APIs of `forkful-core` and
//! `forkful-storefront` without a running database: ranking and pricing
//! rules, error mapping, and router behavior that never reaches a query.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p forkful-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `favorites` - Ranking properties over generated histories
//! - `cart_pricing` - Cart edits priced against a menu
//! - `error_mapping` - `AppError` status codes and response bodies
//! - `router` - Health, auth rejection, and middleware headers
//! - `database` - Wallet, order, and address invariants held by `PostgreSQL`
//!   transactions. Ignored by default; run with `-- --ignored` against a
//!   scratch database named by `FORKFUL_TEST_DATABASE_URL`.

use chrono::{DateTime, Utc};

use forkful_core::{DeliveryPolicy, MenuItemId, Money};
use forkful_storefront::config::StorefrontConfig;
use forkful_storefront::models::MenuItem;

/// Database the ignored `database` tests connect to when
/// `FORKFUL_TEST_DATABASE_URL` is unset.
pub const DEFAULT_TEST_DATABASE_URL: &str = "postgres://forkful@localhost/forkful_test";

/// Connection string for tests that need `PostgreSQL`.
#[must_use]
pub fn test_database_url() -> String {
    std::env::var("FORKFUL_TEST_DATABASE_URL")
        .unwrap_or_else(|_| DEFAULT_TEST_DATABASE_URL.to_owned())
}

/// A fixed instant so recency bonuses are deterministic.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-06-01T18:00:00Z")
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_default()
}

/// A menu item with the given price in pence.
#[must_use]
pub fn menu_item(id: i32, name: &str, price: i64, available: bool) -> MenuItem {
    MenuItem {
        id: MenuItemId::new(id),
        name: name.to_owned(),
        description: None,
        price: Money::from_minor(price),
        category: "Mains".to_owned(),
        image_url: None,
        available,
        created_at: fixed_now(),
        updated_at: fixed_now(),
    }
}

/// The default delivery policy: £2.99 fee, free from £25, £10 minimum.
#[must_use]
pub fn policy() -> DeliveryPolicy {
    DeliveryPolicy::default()
}

/// Configuration for tests, pointing at a database that is never contacted.
///
/// # Errors
///
/// Returns the configuration error if the fixed values are rejected.
pub fn test_config() -> Result<StorefrontConfig, forkful_storefront::config::ConfigError> {
    StorefrontConfig::from_lookup(|key| match key {
        "FORKFUL_DATABASE_URL" => Some(DEFAULT_TEST_DATABASE_URL.to_owned()),
        "FORKFUL_BASE_URL" => Some("http://localhost:3000".to_owned()),
        _ => None,
    })
}
