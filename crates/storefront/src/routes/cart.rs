//! Cart route handlers.
//!
//! The cart lives in the session, so guests can build one before signing in.
//! Every handler responds with the freshly priced cart.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use forkful_core::MenuItemId;

use crate::error::{AppError, Result};
use crate::models::Cart;
use crate::services::cart::{PricedCart, load_cart, price_cart, save_cart};
use crate::state::AppState;

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub item_id: MenuItemId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

/// Quantity update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

/// Price `cart` against the cached menu.
async fn priced(state: &AppState, cart: &Cart) -> Result<Json<PricedCart>> {
    let menu = state.menu().all().await?;
    Ok(Json(price_cart(cart, &menu, &state.config().delivery)?))
}

/// Display the cart.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<PricedCart>> {
    let cart = load_cart(&session).await?;
    priced(&state, &cart).await
}

/// Add a dish. Adding a dish already in the cart increases its quantity.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<AddItemRequest>,
) -> Result<Json<PricedCart>> {
    let item = state
        .menu()
        .get(body.item_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Dish not found".to_owned()))?;
    if !item.available {
        return Err(AppError::Conflict(format!(
            "{} is not available right now",
            item.name
        )));
    }

    let mut cart = load_cart(&session).await?;
    let quantity = cart.add(item.id, body.quantity)?;
    save_cart(&session, &cart).await?;

    tracing::debug!(item_id = %item.id, quantity, "Added to cart");
    priced(&state, &cart).await
}

/// Set a dish's quantity. Zero removes it.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(item_id): Path<MenuItemId>,
    Json(body): Json<UpdateItemRequest>,
) -> Result<Json<PricedCart>> {
    let mut cart = load_cart(&session).await?;
    cart.set_quantity(item_id, body.quantity)?;
    save_cart(&session, &cart).await?;
    priced(&state, &cart).await
}

/// Remove a dish.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Path(item_id): Path<MenuItemId>,
) -> Result<Json<PricedCart>> {
    let mut cart = load_cart(&session).await?;
    cart.remove(item_id)?;
    save_cart(&session, &cart).await?;
    priced(&state, &cart).await
}

/// Empty the cart.
#[instrument(skip(state, session))]
pub async fn clear(State(state): State<AppState>, session: Session) -> Result<Json<PricedCart>> {
    let cart = Cart::default();
    save_cart(&session, &cart).await?;
    priced(&state, &cart).await
}
