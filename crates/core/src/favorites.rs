//! Favorite dish ranking.
//!
//! Aggregates a customer's order history into one entry per dish and ranks
//! the dishes by how often, how much, and how recently they were ordered.
//!
//! # Scoring
//!
//! ```text
//! score = order_count * 2 + total_quantity + recency_bonus
//!
//! recency_bonus = 5  if last ordered within 7 days of `now`
//!               = 2  if within 30 days
//!               = 0  otherwise
//! ```
//!
//! `order_count` counts distinct orders containing the dish, so a dish listed
//! twice in one order counts once there, while both lines add to
//! `total_quantity`.
//!
//! The function is pure: the caller supplies `now`, and the output depends on
//! nothing else.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{MenuItemId, Money, OrderId};

/// Name reported for a dish whose line items carry no name.
pub const UNKNOWN_DISH_NAME: &str = "Unknown Dish";

/// Bonus for dishes ordered within [`RECENT_DAYS`].
pub const RECENT_BONUS: u32 = 5;
/// Bonus for dishes ordered within [`LAPSED_DAYS`] but not [`RECENT_DAYS`].
pub const LAPSED_BONUS: u32 = 2;
/// Window for [`RECENT_BONUS`].
pub const RECENT_DAYS: i64 = 7;
/// Window for [`LAPSED_BONUS`].
pub const LAPSED_DAYS: i64 = 30;

/// One line of a past order, as recorded when the order was placed.
///
/// Fields are optional because history outlives the menu: a dish deleted from
/// the menu leaves its order lines without an `item_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDish {
    pub item_id: Option<MenuItemId>,
    pub name: Option<String>,
    pub unit_price: Option<Money>,
    pub quantity: u32,
}

/// A past order with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PastOrder {
    pub order_id: OrderId,
    pub placed_at: DateTime<Utc>,
    pub items: Vec<OrderDish>,
}

/// Aggregated statistics for one dish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteDish {
    pub item_id: MenuItemId,
    pub name: String,
    pub unit_price: Money,
    /// Number of distinct orders containing the dish.
    pub order_count: u32,
    /// Sum of quantities across every line for the dish.
    pub total_quantity: u32,
    pub last_ordered_at: DateTime<Utc>,
    pub score: u32,
}

/// Recency bonus for a dish last ordered at `last` when it is now `now`.
#[must_use]
pub fn recency_bonus(last: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let age = now - last;
    if age <= Duration::days(RECENT_DAYS) {
        RECENT_BONUS
    } else if age <= Duration::days(LAPSED_DAYS) {
        LAPSED_BONUS
    } else {
        0
    }
}

/// Rank dishes across `orders` by score, highest first.
///
/// Dishes with equal scores keep the order in which they were first seen in
/// `orders`. Lines without an `item_id` are skipped. Missing names and prices
/// default to [`UNKNOWN_DISH_NAME`] and zero; the reported name and price come
/// from the most recent line for the dish.
#[must_use]
pub fn rank_favorites(orders: &[PastOrder], now: DateTime<Utc>) -> Vec<FavoriteDish> {
    let mut dishes: Vec<FavoriteDish> = Vec::new();
    let mut index: HashMap<MenuItemId, usize> = HashMap::new();
    // Last order position that counted toward each dish's order_count.
    let mut counted_in: Vec<usize> = Vec::new();

    for (position, order) in orders.iter().enumerate() {
        for line in &order.items {
            let Some(item_id) = line.item_id else {
                continue;
            };

            let slot = *index.entry(item_id).or_insert_with(|| {
                dishes.push(FavoriteDish {
                    item_id,
                    name: display_name(line),
                    unit_price: line.unit_price.unwrap_or(Money::ZERO),
                    order_count: 0,
                    total_quantity: 0,
                    last_ordered_at: order.placed_at,
                    score: 0,
                });
                counted_in.push(usize::MAX);
                dishes.len() - 1
            });

            let (Some(dish), Some(seen)) = (dishes.get_mut(slot), counted_in.get_mut(slot)) else {
                continue;
            };

            if *seen != position {
                *seen = position;
                dish.order_count = dish.order_count.saturating_add(1);
            }
            dish.total_quantity = dish.total_quantity.saturating_add(line.quantity);

            if order.placed_at > dish.last_ordered_at {
                dish.last_ordered_at = order.placed_at;
                dish.name = display_name(line);
                dish.unit_price = line.unit_price.unwrap_or(Money::ZERO);
            }
        }
    }

    for dish in &mut dishes {
        dish.score = dish
            .order_count
            .saturating_mul(2)
            .saturating_add(dish.total_quantity)
            .saturating_add(recency_bonus(dish.last_ordered_at, now));
    }

    // `sort_by` is stable, so equal scores keep first-seen order.
    dishes.sort_by(|a, b| b.score.cmp(&a.score));
    dishes
}

fn display_name(line: &OrderDish) -> String {
    line.name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_DISH_NAME)
        .to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn dish(id: i32, qty: u32) -> OrderDish {
        OrderDish {
            item_id: Some(MenuItemId::new(id)),
            name: Some(format!("Dish {id}")),
            unit_price: Some(Money::from_minor(500)),
            quantity: qty,
        }
    }

    fn order(id: i32, days_ago: i64, items: Vec<OrderDish>) -> PastOrder {
        PastOrder {
            order_id: OrderId::new(id),
            placed_at: now() - Duration::days(days_ago),
            items,
        }
    }

    #[test]
    fn test_empty_history() {
        assert!(rank_favorites(&[], now()).is_empty());
    }

    #[test]
    fn test_worked_example() {
        // x ordered twice (2 + 1), y once; all long ago so no recency bonus.
        let orders = vec![
            order(1, 90, vec![dish(1, 2)]),
            order(2, 90, vec![dish(1, 1)]),
            order(3, 90, vec![dish(2, 1)]),
        ];

        let ranked = rank_favorites(&orders, now());

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].item_id, MenuItemId::new(1));
        assert_eq!(ranked[0].order_count, 2);
        assert_eq!(ranked[0].total_quantity, 3);
        assert_eq!(ranked[0].score, 7);
        assert_eq!(ranked[1].item_id, MenuItemId::new(2));
        assert_eq!(ranked[1].order_count, 1);
        assert_eq!(ranked[1].total_quantity, 1);
        assert_eq!(ranked[1].score, 3);
    }

    #[test]
    fn test_duplicate_lines_in_one_order_count_once() {
        let orders = vec![order(1, 60, vec![dish(1, 1), dish(1, 4)])];

        let ranked = rank_favorites(&orders, now());

        assert_eq!(ranked[0].order_count, 1);
        assert_eq!(ranked[0].total_quantity, 5);
        assert_eq!(ranked[0].score, 7);
    }

    #[test]
    fn test_recency_bonus_windows() {
        assert_eq!(recency_bonus(now(), now()), RECENT_BONUS);
        assert_eq!(recency_bonus(now() - Duration::days(7), now()), RECENT_BONUS);
        assert_eq!(recency_bonus(now() - Duration::days(8), now()), LAPSED_BONUS);
        assert_eq!(recency_bonus(now() - Duration::days(30), now()), LAPSED_BONUS);
        assert_eq!(recency_bonus(now() - Duration::days(31), now()), 0);
        // Clock skew: a future timestamp still counts as recent.
        assert_eq!(recency_bonus(now() + Duration::hours(1), now()), RECENT_BONUS);
    }

    #[test]
    fn test_recency_can_reorder_ranking() {
        // Dish 1: base 3, ordered 40 days ago -> 3.
        // Dish 2: base 3, ordered yesterday -> 8.
        let orders = vec![order(1, 40, vec![dish(1, 1)]), order(2, 1, vec![dish(2, 1)])];

        let ranked = rank_favorites(&orders, now());

        assert_eq!(ranked[0].item_id, MenuItemId::new(2));
        assert_eq!(ranked[0].score, 8);
        assert_eq!(ranked[1].score, 3);
    }

    #[test]
    fn test_last_ordered_is_max_timestamp_regardless_of_input_order() {
        let orders = vec![order(1, 3, vec![dish(1, 1)]), order(2, 50, vec![dish(1, 1)])];

        let ranked = rank_favorites(&orders, now());

        assert_eq!(ranked[0].last_ordered_at, now() - Duration::days(3));
        assert_eq!(ranked[0].score, 2 * 2 + 2 + RECENT_BONUS);
    }

    #[test]
    fn test_missing_item_id_is_skipped() {
        let mut orphan = dish(0, 3);
        orphan.item_id = None;
        let orders = vec![order(1, 1, vec![orphan, dish(5, 1)])];

        let ranked = rank_favorites(&orders, now());

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].item_id, MenuItemId::new(5));
    }

    #[test]
    fn test_missing_fields_are_defaulted() {
        let line = OrderDish {
            item_id: Some(MenuItemId::new(9)),
            name: None,
            unit_price: None,
            quantity: 1,
        };
        let ranked = rank_favorites(&[order(1, 1, vec![line])], now());

        assert_eq!(ranked[0].name, UNKNOWN_DISH_NAME);
        assert_eq!(ranked[0].unit_price, Money::ZERO);
    }

    #[test]
    fn test_name_and_price_follow_most_recent_line() {
        let mut old = dish(1, 1);
        old.name = Some("Old Name".to_owned());
        old.unit_price = Some(Money::from_minor(400));
        let mut new = dish(1, 1);
        new.name = Some("Katsu Curry".to_owned());
        new.unit_price = Some(Money::from_minor(950));

        let orders = vec![order(1, 20, vec![old]), order(2, 2, vec![new])];
        let ranked = rank_favorites(&orders, now());

        assert_eq!(ranked[0].name, "Katsu Curry");
        assert_eq!(ranked[0].unit_price, Money::from_minor(950));
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let orders = vec![order(1, 90, vec![dish(3, 1), dish(1, 1), dish(2, 1)])];

        let ids: Vec<i32> = rank_favorites(&orders, now())
            .iter()
            .map(|d| d.item_id.as_i32())
            .collect();

        assert_eq!(ids, vec![3, 1, 2]);
    }
}
