//! Checkout: quote and place an order from the session cart.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use forkful_core::AddressId;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::{Cart, Order};
use crate::services::cart::{load_cart, save_cart};
use crate::services::checkout::{CheckoutQuote, CheckoutRequest, CheckoutService};
use crate::state::AppState;

/// Quote query parameters.
#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    pub address_id: Option<AddressId>,
}

/// Priced cart with the delivery address and wallet balance.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn quote(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Query(query): Query<QuoteQuery>,
) -> Result<Json<CheckoutQuote>> {
    let cart = load_cart(&session).await?;
    let quote = CheckoutService::new(&state)
        .quote(user.id, &cart, query.address_id)
        .await?;
    Ok(Json(quote))
}

/// Place an order and empty the cart.
#[instrument(skip(state, session, user, request), fields(user_id = %user.id))]
pub async fn place(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let cart = load_cart(&session).await?;
    let order = CheckoutService::new(&state)
        .place(user.id, &cart, &request)
        .await?;

    // The order stands even if the session write fails.
    if let Err(e) = save_cart(&session, &Cart::default()).await {
        tracing::warn!(order_id = %order.id, error = %e, "Failed to clear cart after checkout");
    }

    let order_id = order.id.to_string();
    add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order_id.as_str())]));

    Ok((StatusCode::CREATED, Json(order)))
}
