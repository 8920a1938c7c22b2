//! Notification delivery and inbox management.
//!
//! Every notification goes through [`NotificationService::notify`], which
//! honors the customer's preferences. Side-effect notifications (order placed,
//! wallet credited) use [`NotificationService::notify_best_effort`] so a
//! failure never undoes the operation that triggered them.

use sqlx::PgPool;
use tracing::instrument;

use forkful_core::{NotificationId, UserId};

use crate::db::RepositoryError;
use crate::db::notifications::NotificationRepository;
use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::models::{NewNotification, Notification};
use crate::validation::clamp_limit;

/// Default inbox page size.
pub const DEFAULT_LIMIT: u32 = 50;

/// Largest inbox page size.
pub const MAX_LIMIT: u32 = 100;

/// Notification service.
pub struct NotificationService<'a> {
    notifications: NotificationRepository<'a>,
    users: UserRepository<'a>,
}

impl<'a> NotificationService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            notifications: NotificationRepository::new(pool),
            users: UserRepository::new(pool),
        }
    }

    /// Store a notification unless the customer has opted out of its kind.
    ///
    /// Returns `None` when suppressed by preferences.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    #[instrument(skip(self, notification), fields(kind = %notification.kind))]
    pub async fn notify(
        &self,
        user_id: UserId,
        notification: &NewNotification,
    ) -> std::result::Result<Option<Notification>, RepositoryError> {
        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        if !user.preferences.allows(notification.kind) {
            tracing::debug!("Notification suppressed by preferences");
            return Ok(None);
        }

        self.notifications
            .create(user_id, notification)
            .await
            .map(Some)
    }

    /// [`notify`](Self::notify), logging failures instead of returning them.
    pub async fn notify_best_effort(&self, user_id: UserId, notification: &NewNotification) {
        if let Err(e) = self.notify(user_id, notification).await {
            tracing::warn!(
                user_id = %user_id,
                kind = %notification.kind,
                error = %e,
                "Failed to create notification"
            );
        }
    }

    /// Newest notifications first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(
        &self,
        user_id: UserId,
        unread_only: bool,
        limit: Option<u32>,
    ) -> Result<Vec<Notification>> {
        let limit = clamp_limit(limit, DEFAULT_LIMIT, MAX_LIMIT);
        Ok(self.notifications.list(user_id, unread_only, limit).await?)
    }

    /// Number of unread notifications.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn unread_count(&self, user_id: UserId) -> Result<u64> {
        Ok(self.notifications.unread_count(user_id).await?)
    }

    /// Mark one notification read.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if it isn't the user's.
    pub async fn mark_read(&self, user_id: UserId, id: NotificationId) -> Result<Notification> {
        self.notifications
            .mark_read(user_id, id)
            .await
            .map_err(not_found)
    }

    /// Mark everything read. Returns how many changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn mark_all_read(&self, user_id: UserId) -> Result<u64> {
        Ok(self.notifications.mark_all_read(user_id).await?)
    }

    /// Delete one notification.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if it isn't the user's.
    pub async fn delete(&self, user_id: UserId, id: NotificationId) -> Result<()> {
        self.notifications
            .delete(user_id, id)
            .await
            .map_err(not_found)
    }

    /// Delete every notification. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<u64> {
        Ok(self.notifications.clear(user_id).await?)
    }
}

fn not_found(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::NotFound("Notification not found".to_owned()),
        other => other.into(),
    }
}
