//! Wallet route handlers.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use forkful_core::Money;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::WalletTransaction;
use crate::services::wallet::{WalletService, WalletSummary};
use crate::state::AppState;

/// Ledger query parameters.
#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    pub limit: Option<u32>,
}

/// Top-up request body. The amount is in pence.
#[derive(Debug, Deserialize)]
pub struct TopUpRequest {
    pub amount: Money,
}

fn service(state: &AppState) -> WalletService<'_> {
    WalletService::new(state.pool(), state.config().wallet)
}

/// Balance and top-up limits.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<WalletSummary>> {
    Ok(Json(service(&state).summary(user.id).await?))
}

/// Ledger entries, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn transactions(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<TransactionsQuery>,
) -> Result<Json<Vec<WalletTransaction>>> {
    Ok(Json(service(&state).transactions(user.id, query.limit).await?))
}

/// Add funds.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn top_up(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<TopUpRequest>,
) -> Result<(StatusCode, Json<WalletTransaction>)> {
    let transaction = service(&state).top_up(user.id, body.amount).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}
