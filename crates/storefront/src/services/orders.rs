//! Order history, cancellation, and reorder.

use std::collections::HashMap;

use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;

use forkful_core::{MenuItemId, Money, OrderId, UserId};

use crate::db::RepositoryError;
use crate::db::orders::OrderRepository;
use crate::error::{AppError, Result};
use crate::models::{Cart, CartError, MenuItem, NewNotification, Order};
use crate::services::notifications::NotificationService;
use crate::validation::clamp_limit;

/// Default order history page size.
pub const DEFAULT_LIMIT: u32 = 20;

/// Largest order history page size.
pub const MAX_LIMIT: u32 = 50;

/// One page of order history.
#[derive(Debug, Clone, Serialize)]
pub struct OrdersPage {
    pub orders: Vec<Order>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
}

/// A cancelled order and any refund.
#[derive(Debug, Clone, Serialize)]
pub struct Cancellation {
    pub order: Order,
    pub refunded: Option<Money>,
}

/// A dish put back in the cart by a reorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReorderedLine {
    pub item_id: MenuItemId,
    pub name: String,
    /// Quantity now in the cart, after merging and the per-line cap.
    pub quantity: u32,
}

/// A dish a reorder could not add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLine {
    pub name: String,
    pub reason: &'static str,
}

/// Result of copying an old order into the cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReorderOutcome {
    pub added: Vec<ReorderedLine>,
    pub skipped: Vec<SkippedLine>,
}

/// Order service.
pub struct OrderService<'a> {
    pool: &'a PgPool,
    orders: OrderRepository<'a>,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            orders: OrderRepository::new(pool),
        }
    }

    /// Order history, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub async fn list(
        &self,
        user_id: UserId,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<OrdersPage> {
        let limit = clamp_limit(limit, DEFAULT_LIMIT, MAX_LIMIT);
        let offset = offset.unwrap_or(0);

        let orders = self.orders.list_for_user(user_id, limit, offset).await?;
        let total = self.orders.count_for_user(user_id).await?;

        Ok(OrdersPage {
            orders,
            total,
            limit,
            offset,
        })
    }

    /// One of the user's orders.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the order isn't the user's.
    pub async fn get(&self, user_id: UserId, id: OrderId) -> Result<Order> {
        self.orders
            .get(user_id, id)
            .await?
            .ok_or_else(order_not_found)
    }

    /// Cancel an order that the kitchen hasn't started, refunding a wallet
    /// payment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the order isn't the user's and
    /// `AppError::Conflict` if it can no longer be cancelled.
    #[instrument(skip(self))]
    pub async fn cancel(&self, user_id: UserId, id: OrderId) -> Result<Cancellation> {
        let change = self.orders.cancel(user_id, id).await.map_err(|e| match e {
            RepositoryError::NotFound => order_not_found(),
            RepositoryError::Conflict(_) => {
                AppError::Conflict("This order can no longer be cancelled".to_owned())
            }
            other => other.into(),
        })?;

        tracing::info!(refunded = ?change.refunded, "Order cancelled");

        NotificationService::new(self.pool)
            .notify_best_effort(
                user_id,
                &NewNotification::order_cancelled(change.order.id, change.refunded),
            )
            .await;

        Ok(Cancellation {
            order: change.order,
            refunded: change.refunded,
        })
    }

    /// Copy an old order's dishes into `cart`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the order isn't the user's.
    pub async fn reorder(
        &self,
        user_id: UserId,
        id: OrderId,
        cart: &mut Cart,
        menu: &[MenuItem],
    ) -> Result<ReorderOutcome> {
        let order = self.get(user_id, id).await?;
        Ok(reorder_into(cart, &order, menu))
    }
}

/// Add each line of `order` to `cart` if the dish is still orderable.
#[must_use]
pub fn reorder_into(cart: &mut Cart, order: &Order, menu: &[MenuItem]) -> ReorderOutcome {
    let by_id: HashMap<MenuItemId, &MenuItem> = menu.iter().map(|item| (item.id, item)).collect();
    let mut outcome = ReorderOutcome::default();

    for line in &order.items {
        let skip = |reason| SkippedLine {
            name: line.name.clone(),
            reason,
        };

        let Some(item) = line.menu_item_id.and_then(|id| by_id.get(&id)) else {
            outcome.skipped.push(skip("no longer on the menu"));
            continue;
        };
        if !item.available {
            outcome.skipped.push(skip("currently unavailable"));
            continue;
        }

        match cart.add(item.id, line.quantity) {
            Ok(quantity) => outcome.added.push(ReorderedLine {
                item_id: item.id,
                name: item.name.clone(),
                quantity,
            }),
            Err(CartError::TooManyLines) => outcome.skipped.push(skip("cart is full")),
            Err(_) => outcome.skipped.push(skip("quantity not allowed")),
        }
    }

    outcome
}

fn order_not_found() -> AppError {
    AppError::NotFound("Order not found".to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::Utc;
    use forkful_core::{OrderItemId, OrderStatus, OrderTotals, PaymentMethod, PaymentStatus};

    use super::*;
    use crate::models::cart::MAX_LINE_QUANTITY;
    use crate::models::{DeliveryAddress, OrderItem};

    fn dish(id: i32, name: &str, available: bool) -> MenuItem {
        MenuItem {
            id: MenuItemId::new(id),
            name: name.to_owned(),
            description: None,
            price: Money::from_minor(900),
            category: "Mains".to_owned(),
            image_url: None,
            available,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn order(lines: &[(Option<i32>, &str, u32)]) -> Order {
        Order {
            id: OrderId::new(1),
            user_id: UserId::new(1),
            items: lines
                .iter()
                .enumerate()
                .map(|(i, &(item, name, quantity))| OrderItem {
                    id: OrderItemId::new(i32::try_from(i).unwrap()),
                    menu_item_id: item.map(MenuItemId::new),
                    name: name.to_owned(),
                    unit_price: Money::from_minor(900),
                    quantity,
                })
                .collect(),
            totals: OrderTotals {
                subtotal: Money::ZERO,
                delivery_fee: Money::ZERO,
                total: Money::ZERO,
            },
            payment_method: PaymentMethod::Card,
            payment_status: PaymentStatus::Pending,
            status: OrderStatus::Delivered,
            delivery_address: DeliveryAddress {
                label: "Home".to_owned(),
                line1: "1 High Street".to_owned(),
                line2: None,
                city: "London".to_owned(),
                postcode: "SW1A 1AA".to_owned(),
                phone: None,
                instructions: None,
            },
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_reorder_adds_available_and_reports_the_rest() {
        let menu = vec![dish(1, "Ramen", true), dish(2, "Gyoza", false)];
        let past = order(&[
            (Some(1), "Ramen", 2),
            (Some(2), "Gyoza", 1),
            (None, "Old Special", 1),
        ]);
        let mut cart = Cart::default();

        let outcome = reorder_into(&mut cart, &past, &menu);

        assert_eq!(outcome.added.len(), 1);
        assert_eq!(outcome.added[0].name, "Ramen");
        assert_eq!(cart.quantity_of(MenuItemId::new(1)), 2);
        assert_eq!(
            outcome.skipped,
            vec![
                SkippedLine {
                    name: "Gyoza".to_owned(),
                    reason: "currently unavailable"
                },
                SkippedLine {
                    name: "Old Special".to_owned(),
                    reason: "no longer on the menu"
                },
            ]
        );
    }

    #[test]
    fn test_reorder_merges_with_existing_cart() {
        let menu = vec![dish(1, "Ramen", true)];
        let mut cart = Cart::default();
        cart.add(MenuItemId::new(1), 1).unwrap();

        let outcome = reorder_into(&mut cart, &order(&[(Some(1), "Ramen", 2)]), &menu);

        assert_eq!(outcome.added.len(), 1);
        assert_eq!(outcome.added[0].quantity, 3);
        assert_eq!(cart.quantity_of(MenuItemId::new(1)), 3);
    }

    #[test]
    fn test_reorder_reports_capped_quantity() {
        let menu = vec![dish(1, "Ramen", true)];
        let mut cart = Cart::default();
        cart.add(MenuItemId::new(1), 15).unwrap();

        let outcome = reorder_into(&mut cart, &order(&[(Some(1), "Ramen", 10)]), &menu);

        assert_eq!(outcome.added[0].quantity, MAX_LINE_QUANTITY);
        assert_eq!(cart.quantity_of(MenuItemId::new(1)), MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_reorder_uses_current_menu_name() {
        let menu = vec![dish(1, "Tonkotsu Ramen", true)];
        let mut cart = Cart::default();

        let outcome = reorder_into(&mut cart, &order(&[(Some(1), "Ramen", 1)]), &menu);

        assert_eq!(outcome.added[0].name, "Tonkotsu Ramen");
    }
}
