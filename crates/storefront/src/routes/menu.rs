//! Menu browsing. Open to guests.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::instrument;

use forkful_core::MenuItemId;

use crate::error::{AppError, Result};
use crate::models::MenuItem;
use crate::services::menu::MenuFilter;
use crate::state::AppState;

/// List dishes, optionally by category.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(filter): Query<MenuFilter>,
) -> Result<Json<Vec<MenuItem>>> {
    Ok(Json(state.menu().list(&filter).await?))
}

/// Category names, sorted.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    Ok(Json(state.menu().categories().await?))
}

/// One dish, available or not.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<MenuItemId>,
) -> Result<Json<MenuItem>> {
    state
        .menu()
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Dish not found".to_owned()))
}
