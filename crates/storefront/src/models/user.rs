//! User domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use forkful_core::{Email, Money, NotificationKind, UserId};

/// A registered customer.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub full_name: String,
    pub phone: Option<String>,
    pub preferences: NotificationPreferences,
    pub wallet_balance: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Which notifications the customer wants.
///
/// `email` and `sms` are stored for external delivery channels; in-app
/// notifications are gated by `order_updates` and `promotions` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub order_updates: bool,
    pub promotions: bool,
    pub email: bool,
    pub sms: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            order_updates: true,
            promotions: false,
            email: true,
            sms: false,
        }
    }
}

impl NotificationPreferences {
    /// Whether an in-app notification of `kind` should be created.
    ///
    /// Wallet and account notifications are always delivered.
    #[must_use]
    pub const fn allows(self, kind: NotificationKind) -> bool {
        match kind {
            NotificationKind::Order => self.order_updates,
            NotificationKind::Promotion => self.promotions,
            NotificationKind::Wallet | NotificationKind::Account => true,
        }
    }
}
