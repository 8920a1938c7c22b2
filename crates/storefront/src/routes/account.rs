//! Account settings route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user};
use crate::middleware::{RequireAuth, clear_current_user};
use crate::models::{CurrentUser, NotificationPreferences, User, session_keys};
use crate::services::profile::{ProfileService, ProfileUpdate};
use crate::state::AppState;

/// Password change request body.
#[derive(Deserialize)]
pub struct PasswordChangeRequest {
    pub current_password: String,
    pub new_password: String,
    pub new_password_confirm: String,
}

/// Account deletion request body.
#[derive(Deserialize)]
pub struct DeleteAccountRequest {
    pub password: String,
}

/// The signed-in customer's profile.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<User>> {
    Ok(Json(ProfileService::new(state.pool()).get(user.id).await?))
}

/// Update name and phone number.
#[instrument(skip(state, session, user, update), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<User>> {
    let updated = ProfileService::new(state.pool())
        .update(user.id, &update)
        .await?;

    // Keep the session's display name in step.
    session
        .insert(
            session_keys::CURRENT_USER,
            CurrentUser {
                full_name: updated.full_name.clone(),
                ..user
            },
        )
        .await?;

    Ok(Json(updated))
}

/// Replace notification preferences.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn update_preferences(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(preferences): Json<NotificationPreferences>,
) -> Result<Json<User>> {
    let updated = ProfileService::new(state.pool())
        .update_preferences(user.id, preferences)
        .await?;
    Ok(Json(updated))
}

/// Change password.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<PasswordChangeRequest>,
) -> Result<StatusCode> {
    ProfileService::new(state.pool())
        .change_password(
            user.id,
            &body.current_password,
            &body.new_password,
            &body.new_password_confirm,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete the account and sign out.
#[instrument(skip(state, session, user, body), fields(user_id = %user.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Json(body): Json<DeleteAccountRequest>,
) -> Result<StatusCode> {
    ProfileService::new(state.pool())
        .delete_account(user.id, &body.password)
        .await?;

    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}
