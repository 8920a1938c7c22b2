//! Domain models for the storefront.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`].

pub mod address;
pub mod cart;
pub mod menu;
pub mod notification;
pub mod order;
pub mod session;
pub mod user;
pub mod wallet;

pub use address::{Address, AddressInput};
pub use cart::{Cart, CartError, CartLine};
pub use menu::{MenuItem, NewMenuItem};
pub use notification::{NewNotification, Notification};
pub use order::{DeliveryAddress, NewOrder, NewOrderItem, Order, OrderItem};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{NotificationPreferences, User};
pub use wallet::{TopUpError, WalletLimits, WalletTransaction};
