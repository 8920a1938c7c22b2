//! Order history, cancellation, and reorder.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use forkful_core::OrderId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::Order;
use crate::services::cart::{PricedCart, load_cart, price_cart, save_cart};
use crate::services::orders::{Cancellation, OrderService, OrdersPage, ReorderOutcome};
use crate::state::AppState;

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// What a reorder added and skipped, with the updated cart.
#[derive(Debug, Serialize)]
pub struct ReorderResponse {
    #[serde(flatten)]
    pub outcome: ReorderOutcome,
    pub cart: PricedCart,
}

/// Order history, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<PageQuery>,
) -> Result<Json<OrdersPage>> {
    let page = OrderService::new(state.pool())
        .list(user.id, query.limit, query.offset)
        .await?;
    Ok(Json(page))
}

/// One order with its items.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    Ok(Json(OrderService::new(state.pool()).get(user.id, id).await?))
}

/// Cancel an order, refunding a wallet payment.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Cancellation>> {
    Ok(Json(OrderService::new(state.pool()).cancel(user.id, id).await?))
}

/// Add the dishes from a past order to the cart.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn reorder(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Path(id): Path<OrderId>,
) -> Result<Json<ReorderResponse>> {
    let menu = state.menu().all().await?;
    let mut cart = load_cart(&session).await?;

    let outcome = OrderService::new(state.pool())
        .reorder(user.id, id, &mut cart, &menu)
        .await?;
    save_cart(&session, &cart).await?;

    let cart = price_cart(&cart, &menu, &state.config().delivery)?;
    Ok(Json(ReorderResponse { outcome, cart }))
}
