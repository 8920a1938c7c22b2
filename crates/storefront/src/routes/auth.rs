//! Sign-up, sign-in, and sign-out.
//!
//! A successful sign-up or sign-in rotates the session ID and stores the
//! customer's identity in the session. Sign-out discards the whole session.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, NewNotification, User};
use crate::services::auth::AuthService;
use crate::services::notifications::NotificationService;
use crate::services::profile::ProfileService;
use crate::state::AppState;

/// Sign-up request body.
#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub full_name: String,
}

/// Sign-in request body.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Store `user` in the session and tag Sentry events with them.
async fn sign_in(session: &Session, user: &User) -> Result<()> {
    let current = CurrentUser {
        id: user.id,
        email: user.email.clone(),
        full_name: user.full_name.clone(),
    };
    set_current_user(session, &current).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

/// Create an account and sign in.
#[instrument(skip(state, session, body))]
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<SignupRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let user = AuthService::new(state.pool())
        .register(
            &body.email,
            &body.password,
            &body.password_confirm,
            &body.full_name,
        )
        .await?;

    sign_in(&session, &user).await?;
    add_breadcrumb("auth", "Signed up", None);

    NotificationService::new(state.pool())
        .notify_best_effort(user.id, &NewNotification::welcome(&user.full_name))
        .await;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Sign in with email and password.
#[instrument(skip(state, session, body))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<User>> {
    let user = AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await?;

    sign_in(&session, &user).await?;
    add_breadcrumb("auth", "Signed in", None);

    Ok(Json(user))
}

/// Sign out. Succeeds whether or not anyone was signed in.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The signed-in customer's account.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<User>> {
    let user = ProfileService::new(state.pool()).get(user.id).await?;
    Ok(Json(user))
}
