//! Account settings: profile, notification preferences, password, deletion.

use serde::Deserialize;
use sqlx::PgPool;
use tracing::instrument;

use forkful_core::UserId;

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::models::{NewNotification, NotificationPreferences, User};
use crate::services::auth::{AuthService, validate_name};
use crate::services::notifications::NotificationService;
use crate::validation;

/// Profile form.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Profile service.
pub struct ProfileService<'a> {
    pool: &'a PgPool,
    users: UserRepository<'a>,
}

impl<'a> ProfileService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            users: UserRepository::new(pool),
        }
    }

    /// The signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the account no longer exists.
    pub async fn get(&self, user_id: UserId) -> Result<User> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or_else(account_not_found)
    }

    /// Update name and phone number.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Auth` for a bad name and `AppError::Validation` for
    /// a bad phone number.
    #[instrument(skip(self, update))]
    pub async fn update(&self, user_id: UserId, update: &ProfileUpdate) -> Result<User> {
        let full_name = validate_name(&update.full_name)?;
        let phone = match update.phone.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(validation::phone(raw)?),
        };

        self.users
            .update_profile(user_id, &full_name, phone.as_deref())
            .await
            .map_err(missing_account)
    }

    /// Replace notification preferences.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the account no longer exists.
    pub async fn update_preferences(
        &self,
        user_id: UserId,
        preferences: NotificationPreferences,
    ) -> Result<User> {
        self.users
            .update_preferences(user_id, preferences)
            .await
            .map_err(missing_account)
    }

    /// Change password and leave an account notification.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Auth` if the current password is wrong or the new
    /// one is rejected.
    pub async fn change_password(
        &self,
        user_id: UserId,
        current: &str,
        new: &str,
        new_confirm: &str,
    ) -> Result<()> {
        AuthService::new(self.pool)
            .change_password(user_id, current, new, new_confirm)
            .await?;

        NotificationService::new(self.pool)
            .notify_best_effort(user_id, &NewNotification::password_changed())
            .await;

        Ok(())
    }

    /// Delete the account after confirming the password. Everything the user
    /// owns is removed with it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Auth` if the password is wrong.
    #[instrument(skip(self, password))]
    pub async fn delete_account(&self, user_id: UserId, password: &str) -> Result<()> {
        AuthService::new(self.pool)
            .confirm_password(user_id, password)
            .await?;

        if !self.users.delete(user_id).await? {
            return Err(account_not_found());
        }

        tracing::info!(user_id = %user_id, "Account deleted");
        Ok(())
    }
}

fn account_not_found() -> AppError {
    AppError::NotFound("Account not found".to_owned())
}

fn missing_account(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => account_not_found(),
        other => other.into(),
    }
}
