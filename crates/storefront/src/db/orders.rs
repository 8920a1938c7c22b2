//! Order repository.
//!
//! An order and its lines are written in one transaction. Wallet payments
//! debit the balance in the same transaction, so an order paid from the
//! wallet never exists without its ledger row.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use forkful_core::{
    MenuItemId, Money, OrderDish, OrderId, OrderItemId, OrderStatus, OrderTotals, PastOrder,
    PaymentMethod, PaymentStatus, UserId, WalletTransactionKind,
};

use super::wallet::{self, LedgerEntry};
use super::{RepositoryError, quantity_from_db, quantity_to_db};
use crate::models::order::{DeliveryAddress, NewOrder, Order, OrderItem};

const ORDER_COLUMNS: &str = "id, user_id, subtotal, delivery_fee, total, payment_method, \
                             payment_status, status, delivery_address, notes, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    subtotal: Money,
    delivery_fee: Money,
    total: Money,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
    status: OrderStatus,
    delivery_address: Json<DeliveryAddress>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            items,
            totals: OrderTotals {
                subtotal: self.subtotal,
                delivery_fee: self.delivery_fee,
                total: self.total,
            },
            payment_method: self.payment_method,
            payment_status: self.payment_status,
            status: self.status,
            delivery_address: self.delivery_address.0,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    menu_item_id: Option<MenuItemId>,
    name: String,
    unit_price: Money,
    quantity: i32,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            menu_item_id: row.menu_item_id,
            name: row.name,
            unit_price: row.unit_price,
            quantity: quantity_from_db(row.quantity)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct HistoryRow {
    order_id: OrderId,
    placed_at: DateTime<Utc>,
    menu_item_id: Option<MenuItemId>,
    name: String,
    unit_price: Money,
    quantity: i32,
}

/// Result of a status change that may have refunded a wallet payment.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub order: Order,
    /// Amount returned to the wallet, if the order was cancelled after a
    /// wallet payment.
    pub refunded: Option<Money>,
}

/// Repository for orders and their line items.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Write a new order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InsufficientFunds` if paying from the wallet
    /// and the balance does not cover the total. Nothing is written in that
    /// case.
    pub async fn place(&self, new: &NewOrder) -> Result<Order, RepositoryError> {
        let debit = new.totals.total.checked_neg().ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "order total {} is out of range",
                new.totals.total
            ))
        })?;

        let mut tx = self.pool.begin().await?;

        let balance_after = if new.payment_method == PaymentMethod::Wallet {
            Some(wallet::debit(&mut tx, new.user_id, new.totals.total).await?)
        } else {
            None
        };

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO orders
                (user_id, subtotal, delivery_fee, total, payment_method, payment_status,
                 delivery_address, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(new.user_id)
        .bind(new.totals.subtotal)
        .bind(new.totals.delivery_fee)
        .bind(new.totals.total)
        .bind(new.payment_method)
        .bind(new.payment_method.initial_status())
        .bind(Json(&new.delivery_address))
        .bind(new.notes.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(new.items.len());
        for item in &new.items {
            let item_row = sqlx::query_as::<_, OrderItemRow>(
                r"
                INSERT INTO order_items (order_id, menu_item_id, name, unit_price, quantity)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, order_id, menu_item_id, name, unit_price, quantity
                ",
            )
            .bind(row.id)
            .bind(item.menu_item_id)
            .bind(&item.name)
            .bind(item.unit_price)
            .bind(quantity_to_db(item.quantity))
            .fetch_one(&mut *tx)
            .await?;
            items.push(OrderItem::try_from(item_row)?);
        }

        if let Some(balance_after) = balance_after {
            let description = format!("Payment for order #{}", row.id);
            wallet::record(
                &mut tx,
                &LedgerEntry {
                    user_id: new.user_id,
                    kind: WalletTransactionKind::OrderPayment,
                    amount: debit,
                    balance_after,
                    order_id: Some(row.id),
                    description: &description,
                },
            )
            .await?;
        }

        tx.commit().await?;

        Ok(row.into_order(items))
    }

    /// A page of the user's orders, newest first, with their lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(user_id)
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<i32> = rows.iter().map(|row| row.id.as_i32()).collect();
        let mut items = self.items_for(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let lines = items.remove(&row.id).unwrap_or_default();
                row.into_order(lines)
            })
            .collect())
    }

    /// Number of orders the user has placed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_for_user(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool)
            .await?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// One order, scoped to its owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, user_id: UserId, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        self.attach_items(row).await
    }

    /// One order regardless of owner. For operator tooling.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        self.attach_items(row).await
    }

    /// Every order the user has placed, oldest first, reduced to what
    /// favorites ranking needs.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn history(&self, user_id: UserId) -> Result<Vec<PastOrder>, RepositoryError> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r"
            SELECT o.id AS order_id, o.created_at AS placed_at,
                   oi.menu_item_id, oi.name, oi.unit_price, oi.quantity
            FROM orders o
            JOIN order_items oi ON oi.order_id = o.id
            WHERE o.user_id = $1
            ORDER BY o.created_at ASC, o.id ASC, oi.id ASC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let mut orders: Vec<PastOrder> = Vec::new();
        for row in rows {
            let dish = OrderDish {
                item_id: row.menu_item_id,
                name: Some(row.name),
                unit_price: Some(row.unit_price),
                quantity: quantity_from_db(row.quantity)?,
            };
            match orders.last_mut() {
                Some(last) if last.order_id == row.order_id => last.items.push(dish),
                _ => orders.push(PastOrder {
                    order_id: row.order_id,
                    placed_at: row.placed_at,
                    items: vec![dish],
                }),
            }
        }

        Ok(orders)
    }

    /// Cancel one of the user's orders, refunding a wallet payment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist or
    /// belongs to another user, and `RepositoryError::Conflict` if it has
    /// gone too far to cancel.
    pub async fn cancel(&self, user_id: UserId, id: OrderId) -> Result<StatusChange, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2 FOR UPDATE"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let change = transition(&mut tx, row, OrderStatus::Cancelled).await?;
        tx.commit().await?;

        Ok(change)
    }

    /// Move an order to `status`. Cancelling refunds a wallet payment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist and
    /// `RepositoryError::Conflict` if the transition is not allowed.
    pub async fn advance_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<StatusChange, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let change = transition(&mut tx, row, status).await?;
        tx.commit().await?;

        Ok(change)
    }

    async fn attach_items(&self, row: Option<OrderRow>) -> Result<Option<Order>, RepositoryError> {
        let Some(row) = row else {
            return Ok(None);
        };
        let mut items = self.items_for(&[row.id.as_i32()]).await?;
        let lines = items.remove(&row.id).unwrap_or_default();
        Ok(Some(row.into_order(lines)))
    }

    async fn items_for(
        &self,
        order_ids: &[i32],
    ) -> Result<HashMap<OrderId, Vec<OrderItem>>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT id, order_id, menu_item_id, name, unit_price, quantity
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id ASC, id ASC
            ",
        )
        .bind(order_ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            let order_id = row.order_id;
            grouped
                .entry(order_id)
                .or_default()
                .push(OrderItem::try_from(row)?);
        }
        Ok(grouped)
    }
}

/// Apply a status change to a locked order row.
async fn transition(
    conn: &mut PgConnection,
    row: OrderRow,
    next: OrderStatus,
) -> Result<StatusChange, RepositoryError> {
    if !row.status.can_transition_to(next) {
        return Err(RepositoryError::Conflict(format!(
            "order cannot move from {} to {}",
            row.status, next
        )));
    }

    let refund_due = next == OrderStatus::Cancelled
        && row.payment_method == PaymentMethod::Wallet
        && row.payment_status == PaymentStatus::Paid;

    let refunded = if refund_due {
        let balance_after = wallet::refund(&mut *conn, row.user_id, row.total).await?;
        let description = format!("Refund for order #{}", row.id);
        wallet::record(
            &mut *conn,
            &LedgerEntry {
                user_id: row.user_id,
                kind: WalletTransactionKind::Refund,
                amount: row.total,
                balance_after,
                order_id: Some(row.id),
                description: &description,
            },
        )
        .await?;
        Some(row.total)
    } else {
        None
    };

    let payment_status = if refund_due {
        PaymentStatus::Refunded
    } else {
        row.payment_status
    };

    let updated = sqlx::query_as::<_, OrderRow>(&format!(
        r"
        UPDATE orders
        SET status = $2, payment_status = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING {ORDER_COLUMNS}
        "
    ))
    .bind(row.id)
    .bind(next)
    .bind(payment_status)
    .fetch_one(&mut *conn)
    .await?;

    let items = sqlx::query_as::<_, OrderItemRow>(
        r"
        SELECT id, order_id, menu_item_id, name, unit_price, quantity
        FROM order_items
        WHERE order_id = $1
        ORDER BY id ASC
        ",
    )
    .bind(row.id)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(OrderItem::try_from)
    .collect::<Result<Vec<_>, _>>()?;

    Ok(StatusChange {
        order: updated.into_order(items),
        refunded,
    })
}
