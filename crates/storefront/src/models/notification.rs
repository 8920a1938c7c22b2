//! In-app notification types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use forkful_core::{Money, NotificationId, NotificationKind, OrderId, OrderStatus, UserId};

/// A notification shown in the customer's inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: NotificationId,
    #[serde(skip)]
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// A notification to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl NewNotification {
    /// Confirmation sent when an order is placed.
    #[must_use]
    pub fn order_placed(order_id: OrderId, total: Money) -> Self {
        Self {
            kind: NotificationKind::Order,
            title: "Order placed".to_owned(),
            message: format!("Your order #{order_id} for {total} has been placed."),
        }
    }

    /// Sent when the kitchen or driver moves an order along.
    #[must_use]
    pub fn order_status(order_id: OrderId, status: OrderStatus) -> Self {
        let message = match status {
            OrderStatus::Confirmed => format!("The kitchen has confirmed order #{order_id}."),
            OrderStatus::Preparing => format!("Order #{order_id} is being prepared."),
            OrderStatus::OutForDelivery => format!("Order #{order_id} is on its way."),
            OrderStatus::Delivered => format!("Order #{order_id} has been delivered. Enjoy!"),
            OrderStatus::Cancelled => format!("Order #{order_id} has been cancelled."),
            OrderStatus::Pending => format!("Order #{order_id} is waiting for the kitchen."),
        };
        Self {
            kind: NotificationKind::Order,
            title: status.label().to_owned(),
            message,
        }
    }

    /// Sent when the customer cancels, noting any wallet refund.
    #[must_use]
    pub fn order_cancelled(order_id: OrderId, refunded: Option<Money>) -> Self {
        let message = match refunded {
            Some(amount) => format!(
                "Order #{order_id} has been cancelled and {amount} was returned to your wallet."
            ),
            None => format!("Order #{order_id} has been cancelled."),
        };
        Self {
            kind: NotificationKind::Order,
            title: "Order cancelled".to_owned(),
            message,
        }
    }

    /// Sent after money is added to the wallet.
    #[must_use]
    pub fn wallet_credited(amount: Money, balance: Money) -> Self {
        Self {
            kind: NotificationKind::Wallet,
            title: "Wallet topped up".to_owned(),
            message: format!("{amount} was added to your wallet. New balance: {balance}."),
        }
    }

    /// Sent after a password change.
    #[must_use]
    pub fn password_changed() -> Self {
        Self {
            kind: NotificationKind::Account,
            title: "Password changed".to_owned(),
            message: "Your password was changed. If this wasn't you, contact support.".to_owned(),
        }
    }

    /// Sent once after signup.
    #[must_use]
    pub fn welcome(full_name: &str) -> Self {
        Self {
            kind: NotificationKind::Account,
            title: "Welcome to Forkful".to_owned(),
            message: format!("Hi {full_name}, your account is ready. Time to order something tasty."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_format_money() {
        let placed = NewNotification::order_placed(OrderId::new(42), Money::from_minor(2349));
        assert_eq!(placed.message, "Your order #42 for £23.49 has been placed.");
        assert_eq!(placed.kind, NotificationKind::Order);

        let refund =
            NewNotification::order_cancelled(OrderId::new(7), Some(Money::from_minor(1500)));
        assert!(refund.message.contains("£15.00 was returned"));
    }

    #[test]
    fn test_status_title_uses_label() {
        let n = NewNotification::order_status(OrderId::new(3), OrderStatus::OutForDelivery);
        assert_eq!(n.title, "Out for delivery");
        assert_eq!(n.message, "Order #3 is on its way.");
    }
}
