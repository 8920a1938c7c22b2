//! Menu repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use forkful_core::{MenuItemId, Money};

use super::{RepositoryError, conflict_on_unique};
use crate::models::menu::{MenuItem, NewMenuItem};

#[derive(sqlx::FromRow)]
struct MenuItemRow {
    id: MenuItemId,
    name: String,
    description: Option<String>,
    price: Money,
    category: String,
    image_url: Option<String>,
    available: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MenuItemRow> for MenuItem {
    fn from(row: MenuItemRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            category: row.category,
            image_url: row.image_url,
            available: row.available,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for menu items.
pub struct MenuRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MenuRepository<'a> {
    /// Create a new menu repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every dish, available or not, ordered by category then name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<MenuItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, MenuItemRow>(
            r"
            SELECT id, name, description, price, category, image_url, available,
                   created_at, updated_at
            FROM menu_items
            ORDER BY category ASC, name ASC, id ASC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(MenuItem::from).collect())
    }

    /// Dishes with the given IDs. Missing IDs are simply absent from the result.
    ///
    /// Checkout uses this to read authoritative prices, bypassing the cache.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[MenuItemId]) -> Result<Vec<MenuItem>, RepositoryError> {
        let raw: Vec<i32> = ids.iter().map(MenuItemId::as_i32).collect();

        let rows = sqlx::query_as::<_, MenuItemRow>(
            r"
            SELECT id, name, description, price, category, image_url, available,
                   created_at, updated_at
            FROM menu_items
            WHERE id = ANY($1)
            ",
        )
        .bind(&raw)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(MenuItem::from).collect())
    }

    /// Insert a dish.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a dish with the same name exists
    /// in the same category.
    pub async fn insert(&self, item: &NewMenuItem) -> Result<MenuItem, RepositoryError> {
        let row = sqlx::query_as::<_, MenuItemRow>(
            r"
            INSERT INTO menu_items (name, description, price, category, image_url, available)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, description, price, category, image_url, available,
                      created_at, updated_at
            ",
        )
        .bind(&item.name)
        .bind(item.description.as_deref())
        .bind(item.price)
        .bind(&item.category)
        .bind(item.image_url.as_deref())
        .bind(item.available)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "dish already exists in this category"))?;

        Ok(row.into())
    }

    /// Delete every dish. Order history keeps its snapshots with the dish
    /// reference cleared.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_all(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM menu_items")
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
