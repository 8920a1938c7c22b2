//! A customer's favorite dishes, ranked from their order history.

use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;

use forkful_core::{FavoriteDish, UserId, rank_favorites};

use crate::db::orders::OrderRepository;
use crate::error::Result;
use crate::models::MenuItem;
use crate::validation::clamp_limit;

/// Default number of favorites returned.
pub const DEFAULT_LIMIT: u32 = 10;

/// Largest number of favorites returned.
pub const MAX_LIMIT: u32 = 50;

/// A ranked dish with whether it can be ordered right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Favorite {
    #[serde(flatten)]
    pub dish: FavoriteDish,
    pub available: bool,
}

/// Favorites service.
pub struct FavoritesService<'a> {
    orders: OrderRepository<'a>,
}

impl<'a> FavoritesService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            orders: OrderRepository::new(pool),
        }
    }

    /// The user's top dishes, best first.
    ///
    /// # Errors
    ///
    /// Returns an error if the order history cannot be loaded.
    #[instrument(skip(self, menu))]
    pub async fn top(
        &self,
        user_id: UserId,
        limit: Option<u32>,
        menu: &[MenuItem],
    ) -> Result<Vec<Favorite>> {
        let limit = clamp_limit(limit, DEFAULT_LIMIT, MAX_LIMIT);
        let history = self.orders.history(user_id).await?;
        let ranked = rank_favorites(&history, Utc::now());

        Ok(with_availability(ranked, limit, menu))
    }
}

/// Truncate to `limit` and mark which dishes are currently orderable.
#[must_use]
pub fn with_availability(ranked: Vec<FavoriteDish>, limit: u32, menu: &[MenuItem]) -> Vec<Favorite> {
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);

    ranked
        .into_iter()
        .take(limit)
        .map(|dish| Favorite {
            available: menu
                .iter()
                .any(|item| item.id == dish.item_id && item.available),
            dish,
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::{Duration, Utc};
    use forkful_core::{MenuItemId, Money, OrderDish, OrderId, PastOrder};

    use super::*;

    fn dish(id: i32, available: bool) -> MenuItem {
        MenuItem {
            id: MenuItemId::new(id),
            name: format!("Dish {id}"),
            description: None,
            price: Money::from_minor(700),
            category: "Mains".to_owned(),
            image_url: None,
            available,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn history() -> Vec<PastOrder> {
        let now = Utc::now();
        (1..=4)
            .map(|i| PastOrder {
                order_id: OrderId::new(i),
                placed_at: now - Duration::days(60),
                items: vec![OrderDish {
                    item_id: Some(MenuItemId::new(i)),
                    name: Some(format!("Dish {i}")),
                    unit_price: Some(Money::from_minor(700)),
                    quantity: u32::try_from(i).unwrap(),
                }],
            })
            .collect()
    }

    #[test]
    fn test_truncates_to_limit() {
        let ranked = rank_favorites(&history(), Utc::now());
        let favorites = with_availability(ranked, 2, &[]);

        assert_eq!(favorites.len(), 2);
        assert_eq!(favorites[0].dish.item_id, MenuItemId::new(4));
        assert_eq!(favorites[1].dish.item_id, MenuItemId::new(3));
    }

    #[test]
    fn test_marks_availability() {
        let ranked = rank_favorites(&history(), Utc::now());
        let menu = vec![dish(4, true), dish(3, false)];
        let favorites = with_availability(ranked, 10, &menu);

        assert!(favorites[0].available);
        assert!(!favorites[1].available);
        // Dish 2 was removed from the menu entirely.
        assert!(!favorites[2].available);
    }

    #[test]
    fn test_serializes_flat() {
        let ranked = rank_favorites(&history(), Utc::now());
        let favorites = with_availability(ranked, 1, &[dish(4, true)]);
        let json = serde_json::to_value(&favorites[0]).unwrap();

        assert_eq!(json["item_id"], 4);
        assert_eq!(json["available"], true);
        assert!(json.get("dish").is_none());
    }
}
