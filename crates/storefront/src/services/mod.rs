//! Business logic services for the storefront.
//!
//! Services validate input, apply business rules, and call the repositories
//! in [`crate::db`]. Route handlers stay thin.
//!
//! # Services
//!
//! - `auth` - Registration, login, password changes
//! - `menu` - Cached menu catalog
//! - `cart` - Cart pricing and session persistence
//! - `checkout` - Placing orders
//! - `orders` - History, cancellation, reorder
//! - `favorites` - Ranked favorite dishes
//! - `addresses` - Saved delivery addresses
//! - `wallet` - Balance, ledger, top-ups
//! - `notifications` - Preference-aware notification inbox
//! - `profile` - Account settings
//! - `dashboard` - Home screen summary

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod dashboard;
pub mod favorites;
pub mod menu;
pub mod notifications;
pub mod orders;
pub mod profile;
pub mod wallet;
