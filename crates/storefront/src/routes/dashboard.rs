//! Home screen summary.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::dashboard::{self, Dashboard};
use crate::state::AppState;

/// Display the signed-in customer's dashboard.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Dashboard>> {
    Ok(Json(dashboard::load(&state, user.id).await?))
}
