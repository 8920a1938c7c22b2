//! Order domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use forkful_core::{
    MenuItemId, Money, OrderDish, OrderId, OrderItemId, OrderStatus, OrderTotals, PastOrder,
    PaymentMethod, PaymentStatus, UserId,
};

/// Delivery address copied onto an order when it is placed.
///
/// Stored as JSON so later edits to the saved address do not rewrite history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub label: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub postcode: String,
    pub phone: Option<String>,
    pub instructions: Option<String>,
}

/// A placed order with its line items.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(skip)]
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    #[serde(flatten)]
    pub totals: OrderTotals,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub delivery_address: DeliveryAddress,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of an order, priced when the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    /// `None` once the dish has been removed from the menu.
    pub menu_item_id: Option<MenuItemId>,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
}

impl OrderItem {
    /// `unit_price * quantity`, saturating.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price
            .checked_mul(self.quantity)
            .unwrap_or(Money::from_minor(i64::MAX))
    }
}

impl Order {
    /// Total number of dishes across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |acc, item| acc.saturating_add(item.quantity))
    }

    /// Whether the customer may still cancel.
    #[must_use]
    pub const fn can_cancel(&self) -> bool {
        self.status.can_cancel()
    }

    /// The order as input to favorites ranking.
    #[must_use]
    pub fn to_past_order(&self) -> PastOrder {
        PastOrder {
            order_id: self.id,
            placed_at: self.created_at,
            items: self
                .items
                .iter()
                .map(|item| OrderDish {
                    item_id: item.menu_item_id,
                    name: Some(item.name.clone()),
                    unit_price: Some(item.unit_price),
                    quantity: item.quantity,
                })
                .collect(),
        }
    }
}

/// An order ready to be written.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub items: Vec<NewOrderItem>,
    pub totals: OrderTotals,
    pub payment_method: PaymentMethod,
    pub delivery_address: DeliveryAddress,
    pub notes: Option<String>,
}

/// A priced line of a [`NewOrder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub menu_item_id: MenuItemId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
}
