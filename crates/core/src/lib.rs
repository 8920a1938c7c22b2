//! Forkful Core - Shared types and pure ordering logic.
//!
//! This crate provides the types used across all Forkful components:
//! - `storefront` - Customer-facing ordering API
//! - `cli` - Command-line tools for migrations, seeding, and operations
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Everything here can be tested without a running database.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, emails, and statuses
//! - [`favorites`] - Ranks a customer's favorite dishes from their order history
//! - [`pricing`] - Subtotal, delivery fee, and minimum order rules

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod favorites;
pub mod pricing;
pub mod types;

pub use favorites::{FavoriteDish, OrderDish, PastOrder, rank_favorites};
pub use pricing::{DeliveryPolicy, OrderTotals, PricingError};
pub use types::*;
