//! Address repository.
//!
//! Each user has at most one default address, guarded by a partial unique
//! index. Creates, deletes, and default switching lock the owner's `users`
//! row first, so concurrent requests for one user are serialized and the
//! index is never violated mid-update.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use forkful_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::address::{Address, AddressInput};

#[derive(sqlx::FromRow)]
struct AddressRow {
    id: AddressId,
    user_id: UserId,
    label: String,
    line1: String,
    line2: Option<String>,
    city: String,
    postcode: String,
    phone: Option<String>,
    instructions: Option<String>,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            label: row.label,
            line1: row.line1,
            line2: row.line2,
            city: row.city,
            postcode: row.postcode,
            phone: row.phone,
            instructions: row.instructions,
            is_default: row.is_default,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for saved delivery addresses.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All addresses for a user, default first then oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, AddressRow>(
            r"
            SELECT id, user_id, label, line1, line2, city, postcode, phone, instructions,
                   is_default, created_at, updated_at
            FROM addresses
            WHERE user_id = $1
            ORDER BY is_default DESC, created_at ASC, id ASC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Address::from).collect())
    }

    /// One address, scoped to its owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(
            r"
            SELECT id, user_id, label, line1, line2, city, postcode, phone, instructions,
                   is_default, created_at, updated_at
            FROM addresses
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Address::from))
    }

    /// The user's default address, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_default(&self, user_id: UserId) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(
            r"
            SELECT id, user_id, label, line1, line2, city, postcode, phone, instructions,
                   is_default, created_at, updated_at
            FROM addresses
            WHERE user_id = $1 AND is_default
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Address::from))
    }

    /// Save a new address. The user's first address becomes the default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already has `max`
    /// addresses, `RepositoryError::NotFound` if the user doesn't exist, and
    /// `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: UserId,
        input: &AddressInput,
        max: usize,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_owner(&mut tx, user_id).await?;

        let (count, has_default): (i64, bool) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(BOOL_OR(is_default), FALSE) FROM addresses WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        if usize::try_from(count).unwrap_or(usize::MAX) >= max {
            return Err(RepositoryError::Conflict(format!(
                "you can save at most {max} addresses"
            )));
        }

        let row = sqlx::query_as::<_, AddressRow>(
            r"
            INSERT INTO addresses
                (user_id, label, line1, line2, city, postcode, phone, instructions, is_default)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, user_id, label, line1, line2, city, postcode, phone, instructions,
                      is_default, created_at, updated_at
            ",
        )
        .bind(user_id)
        .bind(&input.label)
        .bind(&input.line1)
        .bind(input.line2.as_deref())
        .bind(&input.city)
        .bind(&input.postcode)
        .bind(input.phone.as_deref())
        .bind(input.instructions.as_deref())
        .bind(!has_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row.into())
    }

    /// Replace an address's fields. The default flag is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address doesn't exist or
    /// belongs to another user.
    pub async fn update(
        &self,
        user_id: UserId,
        id: AddressId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(
            r"
            UPDATE addresses
            SET label = $3, line1 = $4, line2 = $5, city = $6, postcode = $7,
                phone = $8, instructions = $9, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, label, line1, line2, city, postcode, phone, instructions,
                      is_default, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(user_id)
        .bind(&input.label)
        .bind(&input.line1)
        .bind(input.line2.as_deref())
        .bind(&input.city)
        .bind(&input.postcode)
        .bind(input.phone.as_deref())
        .bind(input.instructions.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete an address. If it was the default, the oldest remaining
    /// address becomes the default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address doesn't exist or
    /// belongs to another user.
    pub async fn delete(&self, user_id: UserId, id: AddressId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_owner(&mut tx, user_id).await?;

        let was_default: bool = sqlx::query_scalar(
            "DELETE FROM addresses WHERE id = $1 AND user_id = $2 RETURNING is_default",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if was_default {
            promote_oldest(&mut tx, user_id).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Make an address the user's default, clearing the previous one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address doesn't exist or
    /// belongs to another user.
    pub async fn set_default(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_owner(&mut tx, user_id).await?;

        sqlx::query(
            r"
            UPDATE addresses
            SET is_default = FALSE, updated_at = NOW()
            WHERE user_id = $1 AND is_default AND id <> $2
            ",
        )
        .bind(user_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, AddressRow>(
            r"
            UPDATE addresses
            SET is_default = TRUE, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, label, line1, line2, city, postcode, phone, instructions,
                      is_default, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        tx.commit().await?;

        Ok(row.into())
    }
}

/// Lock the owner's row so default switching, deletes, and creates for one
/// user run one at a time.
async fn lock_owner(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
) -> Result<(), RepositoryError> {
    sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

    Ok(())
}

/// Make the user's oldest address the default.
async fn promote_oldest(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        UPDATE addresses
        SET is_default = TRUE, updated_at = NOW()
        WHERE id = (
            SELECT id FROM addresses
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            LIMIT 1
        )
        ",
    )
    .bind(user_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
