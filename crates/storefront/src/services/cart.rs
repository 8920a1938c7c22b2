//! Cart pricing and session persistence.

use std::collections::HashMap;

use serde::Serialize;
use tower_sessions::Session;

use forkful_core::pricing::subtotal;
use forkful_core::{DeliveryPolicy, MenuItemId, Money, OrderTotals, PricingError};

use crate::models::{Cart, MenuItem, session_keys};

/// A cart line priced against the current menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedLine {
    pub item_id: MenuItemId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub line_total: Money,
    pub image_url: Option<String>,
}

/// Why a cart line cannot be ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    /// The dish exists but is switched off.
    SoldOut,
    /// The dish is no longer on the menu.
    Removed,
}

/// A cart line left out of the totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnavailableLine {
    pub item_id: MenuItemId,
    /// `None` when the dish was removed from the menu.
    pub name: Option<String>,
    pub quantity: u32,
    pub reason: UnavailableReason,
}

/// A cart with prices, totals, and delivery hints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedCart {
    pub lines: Vec<PricedLine>,
    pub unavailable: Vec<UnavailableLine>,
    #[serde(flatten)]
    pub totals: OrderTotals,
    pub item_count: u32,
    pub minimum_order: Money,
    pub meets_minimum: bool,
    pub remaining_for_free_delivery: Option<Money>,
}

impl PricedCart {
    /// Whether every line can be ordered and the minimum is met.
    #[must_use]
    pub fn is_orderable(&self) -> bool {
        !self.lines.is_empty() && self.unavailable.is_empty() && self.meets_minimum
    }
}

/// Price `cart` against `menu`.
///
/// Lines for dishes that are missing or unavailable are reported in
/// [`PricedCart::unavailable`] and excluded from the totals.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the totals overflow.
pub fn price_cart(
    cart: &Cart,
    menu: &[MenuItem],
    policy: &DeliveryPolicy,
) -> Result<PricedCart, PricingError> {
    let by_id: HashMap<MenuItemId, &MenuItem> = menu.iter().map(|item| (item.id, item)).collect();

    let mut lines = Vec::with_capacity(cart.lines.len());
    let mut unavailable = Vec::new();

    for line in &cart.lines {
        match by_id.get(&line.item_id) {
            Some(item) if item.available => {
                let line_total = item
                    .price
                    .checked_mul(line.quantity)
                    .ok_or(PricingError::Overflow)?;
                lines.push(PricedLine {
                    item_id: item.id,
                    name: item.name.clone(),
                    unit_price: item.price,
                    quantity: line.quantity,
                    line_total,
                    image_url: item.image_url.clone(),
                });
            }
            Some(item) => unavailable.push(UnavailableLine {
                item_id: item.id,
                name: Some(item.name.clone()),
                quantity: line.quantity,
                reason: UnavailableReason::SoldOut,
            }),
            None => unavailable.push(UnavailableLine {
                item_id: line.item_id,
                name: None,
                quantity: line.quantity,
                reason: UnavailableReason::Removed,
            }),
        }
    }

    let sub = subtotal(lines.iter().map(|l| (l.unit_price, l.quantity)))?;
    let totals = policy.quote(sub)?;
    let item_count = lines
        .iter()
        .fold(0_u32, |acc, l| acc.saturating_add(l.quantity));

    Ok(PricedCart {
        meets_minimum: !lines.is_empty() && policy.check_minimum(&totals).is_ok(),
        remaining_for_free_delivery: if lines.is_empty() {
            None
        } else {
            policy.remaining_for_free_delivery(sub)
        },
        minimum_order: policy.minimum_order,
        lines,
        unavailable,
        totals,
        item_count,
    })
}

/// Read the cart from the session; a missing or unreadable cart is empty.
///
/// # Errors
///
/// Returns an error if the session store cannot be read.
pub async fn load_cart(session: &Session) -> Result<Cart, tower_sessions::session::Error> {
    let Some(value) = session.get_value(session_keys::CART).await? else {
        return Ok(Cart::default());
    };

    Ok(serde_json::from_value(value).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Discarding unreadable cart");
        Cart::default()
    }))
}

/// Write the cart back to the session. An empty cart removes the key.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<(), tower_sessions::session::Error> {
    if cart.is_empty() {
        session.remove::<Cart>(session_keys::CART).await?;
        return Ok(());
    }
    session.insert(session_keys::CART, cart).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::CartLine;

    fn m(minor: i64) -> Money {
        Money::from_minor(minor)
    }

    fn dish(id: i32, price: i64, available: bool) -> MenuItem {
        MenuItem {
            id: MenuItemId::new(id),
            name: format!("Dish {id}"),
            description: None,
            price: m(price),
            category: "Mains".to_owned(),
            image_url: None,
            available,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn cart(lines: &[(i32, u32)]) -> Cart {
        Cart {
            lines: lines
                .iter()
                .map(|&(id, quantity)| CartLine {
                    item_id: MenuItemId::new(id),
                    quantity,
                })
                .collect(),
        }
    }

    fn policy() -> DeliveryPolicy {
        DeliveryPolicy {
            delivery_fee: m(299),
            free_delivery_threshold: Some(m(2500)),
            minimum_order: m(1000),
        }
    }

    #[test]
    fn test_prices_available_lines() {
        let menu = vec![dish(1, 850, true), dish(2, 400, true)];
        let priced = price_cart(&cart(&[(1, 2), (2, 1)]), &menu, &policy()).unwrap();

        assert_eq!(priced.lines.len(), 2);
        assert_eq!(priced.lines[0].line_total, m(1700));
        assert_eq!(priced.totals.subtotal, m(2100));
        assert_eq!(priced.totals.delivery_fee, m(299));
        assert_eq!(priced.totals.total, m(2399));
        assert_eq!(priced.item_count, 3);
        assert!(priced.meets_minimum);
        assert_eq!(priced.remaining_for_free_delivery, Some(m(400)));
        assert!(priced.is_orderable());
    }

    #[test]
    fn test_unavailable_and_removed_lines_are_excluded() {
        let menu = vec![dish(1, 1200, true), dish(2, 400, false)];
        let priced = price_cart(&cart(&[(1, 1), (2, 3), (9, 1)]), &menu, &policy()).unwrap();

        assert_eq!(priced.lines.len(), 1);
        assert_eq!(priced.totals.subtotal, m(1200));
        assert_eq!(priced.unavailable.len(), 2);
        assert_eq!(priced.unavailable[0].reason, UnavailableReason::SoldOut);
        assert_eq!(priced.unavailable[0].name.as_deref(), Some("Dish 2"));
        assert_eq!(priced.unavailable[1].reason, UnavailableReason::Removed);
        assert_eq!(priced.unavailable[1].name, None);
        assert!(!priced.is_orderable());
    }

    #[test]
    fn test_free_delivery_at_threshold() {
        let menu = vec![dish(1, 1250, true)];
        let priced = price_cart(&cart(&[(1, 2)]), &menu, &policy()).unwrap();

        assert_eq!(priced.totals.delivery_fee, Money::ZERO);
        assert_eq!(priced.remaining_for_free_delivery, None);
    }

    #[test]
    fn test_below_minimum() {
        let menu = vec![dish(1, 450, true)];
        let priced = price_cart(&cart(&[(1, 1)]), &menu, &policy()).unwrap();

        assert!(!priced.meets_minimum);
        assert!(!priced.is_orderable());
    }

    #[test]
    fn test_empty_cart() {
        let priced = price_cart(&Cart::default(), &[], &policy()).unwrap();

        assert!(priced.lines.is_empty());
        assert_eq!(priced.totals.total, Money::ZERO);
        assert!(!priced.meets_minimum);
        assert_eq!(priced.remaining_for_free_delivery, None);
    }

    #[test]
    fn test_overflow_is_reported() {
        let menu = vec![dish(1, i64::MAX, true)];
        assert_eq!(
            price_cart(&cart(&[(1, 2)]), &menu, &policy()),
            Err(PricingError::Overflow)
        );
    }

    fn memory_session() -> Session {
        Session::new(
            None,
            std::sync::Arc::new(tower_sessions::MemoryStore::default()),
            None,
        )
    }

    #[tokio::test]
    async fn test_unreadable_cart_loads_empty() {
        let session = memory_session();
        session
            .insert(session_keys::CART, serde_json::json!({ "lines": "not a list" }))
            .await
            .unwrap();

        assert!(load_cart(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_saved_cart_loads_back() {
        let session = memory_session();
        save_cart(&session, &cart(&[(1, 2), (3, 1)])).await.unwrap();

        let loaded = load_cart(&session).await.unwrap();
        assert_eq!(loaded.quantity_of(MenuItemId::new(1)), 2);
        assert_eq!(loaded.quantity_of(MenuItemId::new(3)), 1);

        save_cart(&session, &Cart::default()).await.unwrap();
        assert!(session.get_value(session_keys::CART).await.unwrap().is_none());
    }
}
