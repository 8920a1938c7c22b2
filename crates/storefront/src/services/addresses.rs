//! Saved delivery addresses.

use sqlx::PgPool;
use tracing::instrument;

use forkful_core::{AddressId, UserId};

use crate::db::RepositoryError;
use crate::db::addresses::AddressRepository;
use crate::error::{AppError, Result};
use crate::models::{Address, AddressInput};
use crate::validation::ValidationError;

/// Most addresses one customer may save.
pub const MAX_ADDRESSES: usize = 20;

/// Address book service.
pub struct AddressService<'a> {
    addresses: AddressRepository<'a>,
}

impl<'a> AddressService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            addresses: AddressRepository::new(pool),
        }
    }

    /// All saved addresses, default first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Address>> {
        Ok(self.addresses.list(user_id).await?)
    }

    /// Validate and save a new address. The first one becomes the default.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if a field is rejected or the address
    /// book is full.
    #[instrument(skip(self, input))]
    pub async fn create(&self, user_id: UserId, input: &AddressInput) -> Result<Address> {
        let input = input.validated()?;

        self.addresses
            .create(user_id, &input, MAX_ADDRESSES)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => ValidationError::new(
                    "address",
                    format!("You can save at most {MAX_ADDRESSES} addresses"),
                )
                .into(),
                other => AppError::from(other),
            })
    }

    /// Validate and replace an address's fields.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if a field is rejected and
    /// `AppError::NotFound` if the address isn't the user's.
    pub async fn update(
        &self,
        user_id: UserId,
        id: AddressId,
        input: &AddressInput,
    ) -> Result<Address> {
        let input = input.validated()?;
        self.addresses
            .update(user_id, id, &input)
            .await
            .map_err(not_found)
    }

    /// Delete an address, promoting the oldest remaining one if it was the
    /// default.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the address isn't the user's.
    pub async fn delete(&self, user_id: UserId, id: AddressId) -> Result<()> {
        self.addresses.delete(user_id, id).await.map_err(not_found)
    }

    /// Make an address the default.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the address isn't the user's.
    pub async fn set_default(&self, user_id: UserId, id: AddressId) -> Result<Address> {
        self.addresses
            .set_default(user_id, id)
            .await
            .map_err(not_found)
    }
}

fn not_found(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::NotFound("Address not found".to_owned()),
        other => other.into(),
    }
}
