//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness
//! GET  /health/ready                    - Readiness (database ping)
//!
//! # Auth (strict rate limit)
//! POST /api/auth/signup                 - Create an account and sign in
//! POST /api/auth/login                  - Sign in
//! POST /api/auth/logout                 - Sign out
//! GET  /api/auth/me                     - Signed-in customer
//!
//! # Menu and cart (guests allowed)
//! GET  /api/menu                        - Dishes (?category=&include_unavailable=)
//! GET  /api/menu/categories             - Category names
//! GET  /api/menu/{id}                   - One dish
//! GET  /api/cart                        - Priced cart
//! POST /api/cart/items                  - Add a dish
//! PUT  /api/cart/items/{item_id}        - Set quantity (0 removes)
//! DELETE /api/cart/items/{item_id}      - Remove a dish
//! DELETE /api/cart                      - Empty the cart
//!
//! # Signed in
//! GET  /api/dashboard                   - Home screen summary
//! GET  /api/checkout/quote              - Priced cart, address, wallet balance
//! POST /api/checkout                    - Place an order
//! GET  /api/orders                      - Order history (?limit=&offset=)
//! GET  /api/orders/{id}                 - One order
//! POST /api/orders/{id}/cancel          - Cancel a pending or confirmed order
//! POST /api/orders/{id}/reorder         - Copy an order into the cart
//! GET  /api/favorites                   - Ranked favorite dishes (?limit=)
//! GET/POST /api/addresses               - Address book
//! PUT/DELETE /api/addresses/{id}
//! POST /api/addresses/{id}/default
//! GET  /api/wallet                      - Balance and top-up limits
//! GET  /api/wallet/transactions         - Ledger (?limit=)
//! POST /api/wallet/top-up               - Add funds
//! GET/DELETE /api/notifications         - Inbox (?unread_only=&limit=)
//! GET  /api/notifications/unread-count
//! POST /api/notifications/{id}/read
//! POST /api/notifications/read-all
//! DELETE /api/notifications/{id}
//! GET/PUT/DELETE /api/account           - Profile
//! PUT  /api/account/preferences
//! POST /api/account/password
//! ```

pub mod account;
pub mod addresses;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod dashboard;
pub mod favorites;
pub mod health;
pub mod menu;
pub mod notifications;
pub mod orders;
pub mod wallet;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::middleware::{
    api_rate_limiter, auth_rate_limiter, request_id_middleware, security_headers_middleware,
};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the menu routes router.
pub fn menu_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(menu::index))
        .route("/categories", get(menu::categories))
        .route("/{id}", get(menu::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route(
            "/items/{item_id}",
            put(cart::update).delete(cart::remove),
        )
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout::place))
        .route("/quote", get(checkout::quote))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/cancel", post(orders::cancel))
        .route("/{id}/reorder", post(orders::reorder))
}

/// Create the address book routes router.
pub fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(addresses::index).post(addresses::create))
        .route(
            "/{id}",
            put(addresses::update).delete(addresses::delete),
        )
        .route("/{id}/default", post(addresses::set_default))
}

/// Create the wallet routes router.
pub fn wallet_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wallet::show))
        .route("/transactions", get(wallet::transactions))
        .route("/top-up", post(wallet::top_up))
}

/// Create the notification routes router.
pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(notifications::index).delete(notifications::clear))
        .route("/unread-count", get(notifications::unread_count))
        .route("/read-all", post(notifications::mark_all_read))
        .route("/{id}", axum::routing::delete(notifications::delete))
        .route("/{id}/read", post(notifications::mark_read))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(account::show)
                .put(account::update)
                .delete(account::delete),
        )
        .route("/preferences", put(account::update_preferences))
        .route("/password", post(account::change_password))
}

/// Everything under `/api` except auth.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard::show))
        .route("/favorites", get(favorites::index))
        .nest("/menu", menu_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/orders", order_routes())
        .nest("/addresses", address_routes())
        .nest("/wallet", wallet_routes())
        .nest("/notifications", notification_routes())
        .nest("/account", account_routes())
}

/// Create all routes for the storefront, with rate limits applied.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/auth", auth_routes().layer(auth_rate_limiter()))
        .nest("/api", api_routes().layer(api_rate_limiter()))
}

/// Build the complete application: routes, session, request ID, and
/// security headers.
///
/// The session store is a parameter so tests can use an in-memory store.
pub fn build_router<S>(state: AppState, session_layer: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    routes()
        .layer(session_layer)
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state)
}
