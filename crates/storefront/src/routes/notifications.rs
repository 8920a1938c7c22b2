//! Notification inbox.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use forkful_core::NotificationId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::Notification;
use crate::services::notifications::NotificationService;
use crate::state::AppState;

/// Inbox query parameters.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<u32>,
}

/// Unread badge count.
#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: u64,
}

/// Number of notifications a bulk action touched.
#[derive(Debug, Serialize)]
pub struct Affected {
    pub affected: u64,
}

/// Notifications, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Notification>>> {
    let notifications = NotificationService::new(state.pool())
        .list(user.id, query.unread_only, query.limit)
        .await?;
    Ok(Json(notifications))
}

/// Number of unread notifications.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn unread_count(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<UnreadCount>> {
    let count = NotificationService::new(state.pool())
        .unread_count(user.id)
        .await?;
    Ok(Json(UnreadCount { count }))
}

/// Mark one notification read.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn mark_read(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<NotificationId>,
) -> Result<Json<Notification>> {
    let notification = NotificationService::new(state.pool())
        .mark_read(user.id, id)
        .await?;
    Ok(Json(notification))
}

/// Mark every notification read.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn mark_all_read(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Affected>> {
    let affected = NotificationService::new(state.pool())
        .mark_all_read(user.id)
        .await?;
    Ok(Json(Affected { affected }))
}

/// Delete one notification.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<NotificationId>,
) -> Result<StatusCode> {
    NotificationService::new(state.pool())
        .delete(user.id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete every notification.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Affected>> {
    let affected = NotificationService::new(state.pool()).clear(user.id).await?;
    Ok(Json(Affected { affected }))
}
