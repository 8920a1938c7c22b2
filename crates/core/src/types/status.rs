//! Status enums for orders, payments, notifications, and the wallet ledger.
//!
//! Each enum serializes as `snake_case` and, with the `postgres` feature, maps
//! to a PostgreSQL enum type of the same name created by the storefront
//! migrations.

use serde::{Deserialize, Serialize};

/// Error returned when parsing a status from its wire name fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct ParseStatusError {
    /// Which status type was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Implements `as_str`, `Display`, and `FromStr` from a list of
/// `Variant => "wire_name"` pairs.
macro_rules! wire_names {
    ($ty:ident, $kind:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// All variants, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The `snake_case` name used on the wire and in the database.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }

        impl ::core::fmt::Display for $ty {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $ty {
            type Err = ParseStatusError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Self::$variant),)+
                    _ => Err(ParseStatusError {
                        kind: $kind,
                        value: s.to_owned(),
                    }),
                }
            }
        }
    };
}

/// Lifecycle of a food order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    OutForDelivery,
    Delivered,
    Cancelled,
}

wire_names!(OrderStatus, "order status", {
    Pending => "pending",
    Confirmed => "confirmed",
    Preparing => "preparing",
    OutForDelivery => "out_for_delivery",
    Delivered => "delivered",
    Cancelled => "cancelled",
});

impl OrderStatus {
    /// Customer-facing label shown in order history and tracking.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Order placed",
            Self::Confirmed => "Confirmed by the kitchen",
            Self::Preparing => "Being prepared",
            Self::OutForDelivery => "Out for delivery",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Step in the delivery tracker (1-based), or `None` for cancelled orders.
    #[must_use]
    pub const fn progress(self) -> Option<u8> {
        match self {
            Self::Pending => Some(1),
            Self::Confirmed => Some(2),
            Self::Preparing => Some(3),
            Self::OutForDelivery => Some(4),
            Self::Delivered => Some(5),
            Self::Cancelled => None,
        }
    }

    /// Whether the customer may still cancel the order.
    #[must_use]
    pub const fn can_cancel(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// Whether the order has reached a final state.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether moving from `self` to `next` is allowed.
    ///
    /// Orders only move forward through the tracker; cancellation is allowed
    /// from any state where [`can_cancel`](Self::can_cancel) holds.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        if next == Self::Cancelled {
            return self.can_cancel();
        }
        match (self.progress(), next.progress()) {
            (Some(from), Some(to)) => to > from,
            _ => false,
        }
    }
}

/// How the customer chose to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_method", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Prepaid wallet balance, debited at checkout.
    Wallet,
    /// Card, recorded at checkout and captured outside this system.
    Card,
    /// Paid to the driver on delivery.
    CashOnDelivery,
}

wire_names!(PaymentMethod, "payment method", {
    Wallet => "wallet",
    Card => "card",
    CashOnDelivery => "cash_on_delivery",
});

impl PaymentMethod {
    /// Payment status an order starts with when paid this way.
    #[must_use]
    pub const fn initial_status(self) -> PaymentStatus {
        match self {
            Self::Wallet => PaymentStatus::Paid,
            Self::Card | Self::CashOnDelivery => PaymentStatus::Pending,
        }
    }
}

/// Payment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Refunded,
    Failed,
}

wire_names!(PaymentStatus, "payment status", {
    Pending => "pending",
    Paid => "paid",
    Refunded => "refunded",
    Failed => "failed",
});

/// Category of an in-app notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "notification_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Order placed, status changed, cancelled.
    Order,
    /// Wallet top-ups and refunds.
    Wallet,
    /// Security-relevant account changes.
    Account,
    /// Marketing messages.
    Promotion,
}

wire_names!(NotificationKind, "notification kind", {
    Order => "order",
    Wallet => "wallet",
    Account => "account",
    Promotion => "promotion",
});

/// Kind of wallet ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "wallet_transaction_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum WalletTransactionKind {
    TopUp,
    OrderPayment,
    Refund,
}

wire_names!(WalletTransactionKind, "wallet transaction kind", {
    TopUp => "top_up",
    OrderPayment => "order_payment",
    Refund => "refund",
});

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_round_trips_wire_names() {
        for status in OrderStatus::ALL {
            let parsed: OrderStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, *status);
            let json = serde_json::to_string(status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "teleported".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.kind, "order status");
        assert_eq!(err.to_string(), "invalid order status: teleported");
    }

    #[test]
    fn test_cancellation_window() {
        assert!(OrderStatus::Pending.can_cancel());
        assert!(OrderStatus::Confirmed.can_cancel());
        assert!(!OrderStatus::Preparing.can_cancel());
        assert!(!OrderStatus::Delivered.can_cancel());
        assert!(!OrderStatus::Cancelled.can_cancel());
    }

    #[test]
    fn test_transitions_only_move_forward() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Preparing));
        assert!(OrderStatus::Preparing.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Preparing));
        assert!(!OrderStatus::Preparing.can_transition_to(OrderStatus::Preparing));
        assert!(!OrderStatus::Preparing.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn test_labels_and_progress() {
        assert_eq!(OrderStatus::OutForDelivery.label(), "Out for delivery");
        assert_eq!(OrderStatus::Delivered.progress(), Some(5));
        assert_eq!(OrderStatus::Cancelled.progress(), None);
    }

    #[test]
    fn test_payment_method_initial_status() {
        assert_eq!(PaymentMethod::Wallet.initial_status(), PaymentStatus::Paid);
        assert_eq!(PaymentMethod::Card.initial_status(), PaymentStatus::Pending);
        assert_eq!(
            "cash_on_delivery".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::CashOnDelivery
        );
    }
}
