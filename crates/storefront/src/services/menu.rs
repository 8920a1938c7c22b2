//! Menu catalog backed by an in-memory cache.
//!
//! The whole menu is small, so it is cached as one value and filtered in
//! memory. Checkout does not use this cache; it re-reads prices through
//! [`MenuRepository::get_many`].

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{debug, instrument};

use forkful_core::MenuItemId;

use crate::db::RepositoryError;
use crate::db::menu::MenuRepository;
use crate::models::MenuItem;

const MENU_KEY: &str = "menu";

/// Query parameters for listing the menu.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MenuFilter {
    /// Only dishes in this category (case-insensitive).
    #[serde(default)]
    pub category: Option<String>,
    /// Include dishes that are currently unavailable.
    #[serde(default)]
    pub include_unavailable: bool,
}

/// Cached view of the menu.
#[derive(Clone)]
pub struct MenuCatalog {
    pool: PgPool,
    cache: Cache<&'static str, Arc<Vec<MenuItem>>>,
}

impl MenuCatalog {
    /// Create a catalog whose cached menu expires after `ttl`.
    #[must_use]
    pub fn new(pool: PgPool, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();
        Self { pool, cache }
    }

    /// Every dish, available or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the menu must be loaded and the
    /// query fails.
    #[instrument(skip(self))]
    pub async fn all(&self) -> Result<Arc<Vec<MenuItem>>, RepositoryError> {
        if let Some(items) = self.cache.get(MENU_KEY).await {
            debug!("Cache hit for menu");
            return Ok(items);
        }

        let items = Arc::new(MenuRepository::new(&self.pool).list_all().await?);
        self.cache.insert(MENU_KEY, Arc::clone(&items)).await;
        debug!(count = items.len(), "Menu loaded");

        Ok(items)
    }

    /// Dishes matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the menu cannot be loaded.
    pub async fn list(&self, filter: &MenuFilter) -> Result<Vec<MenuItem>, RepositoryError> {
        let items = self.all().await?;
        Ok(filter_menu(&items, filter))
    }

    /// Distinct categories that have at least one available dish, sorted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the menu cannot be loaded.
    pub async fn categories(&self) -> Result<Vec<String>, RepositoryError> {
        let items = self.all().await?;
        Ok(categories_of(&items))
    }

    /// One dish by ID, available or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the menu cannot be loaded.
    pub async fn get(&self, id: MenuItemId) -> Result<Option<MenuItem>, RepositoryError> {
        let items = self.all().await?;
        Ok(items.iter().find(|item| item.id == id).cloned())
    }

    /// Drop the cached menu so the next read reloads it.
    pub async fn invalidate(&self) {
        self.cache.invalidate(MENU_KEY).await;
    }
}

/// Apply a [`MenuFilter`] to a menu.
#[must_use]
pub fn filter_menu(items: &[MenuItem], filter: &MenuFilter) -> Vec<MenuItem> {
    let category = filter
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    items
        .iter()
        .filter(|item| filter.include_unavailable || item.available)
        .filter(|item| category.is_none_or(|c| item.category.eq_ignore_ascii_case(c)))
        .cloned()
        .collect()
}

/// Sorted, distinct categories of available dishes.
#[must_use]
pub fn categories_of(items: &[MenuItem]) -> Vec<String> {
    let mut categories: Vec<String> = items
        .iter()
        .filter(|item| item.available)
        .map(|item| item.category.clone())
        .collect();
    categories.sort_unstable();
    categories.dedup();
    categories
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use forkful_core::Money;

    use super::*;

    fn dish(id: i32, name: &str, category: &str, available: bool) -> MenuItem {
        MenuItem {
            id: MenuItemId::new(id),
            name: name.to_owned(),
            description: None,
            price: Money::from_minor(850),
            category: category.to_owned(),
            image_url: None,
            available,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn menu() -> Vec<MenuItem> {
        vec![
            dish(1, "Margherita", "Pizza", true),
            dish(2, "Calzone", "Pizza", false),
            dish(3, "Tiramisu", "Dessert", true),
            dish(4, "Affogato", "Drinks", false),
        ]
    }

    fn ids(items: &[MenuItem]) -> Vec<i32> {
        items.iter().map(|i| i.id.as_i32()).collect()
    }

    #[test]
    fn test_default_filter_hides_unavailable() {
        let items = filter_menu(&menu(), &MenuFilter::default());
        assert_eq!(ids(&items), vec![1, 3]);
    }

    #[test]
    fn test_category_filter_is_case_insensitive() {
        let filter = MenuFilter {
            category: Some(" pizza ".to_owned()),
            include_unavailable: true,
        };
        assert_eq!(ids(&filter_menu(&menu(), &filter)), vec![1, 2]);
    }

    #[test]
    fn test_blank_category_means_all() {
        let filter = MenuFilter {
            category: Some(String::new()),
            include_unavailable: false,
        };
        assert_eq!(ids(&filter_menu(&menu(), &filter)), vec![1, 3]);
    }

    #[test]
    fn test_categories_skip_fully_unavailable() {
        assert_eq!(categories_of(&menu()), vec!["Dessert", "Pizza"]);
    }
}
