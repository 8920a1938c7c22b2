//! Favorite dishes.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::favorites::{Favorite, FavoritesService};
use crate::state::AppState;

/// Favorites query parameters.
#[derive(Debug, Deserialize)]
pub struct FavoritesQuery {
    pub limit: Option<u32>,
}

/// The signed-in customer's most-ordered dishes, best first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<FavoritesQuery>,
) -> Result<Json<Vec<Favorite>>> {
    let menu = state.menu().all().await?;
    let favorites = FavoritesService::new(state.pool())
        .top(user.id, query.limit, &menu)
        .await?;
    Ok(Json(favorites))
}
