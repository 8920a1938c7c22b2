//! Home screen summary for a signed-in customer.

use serde::Serialize;

use forkful_core::{Money, UserId};

use crate::db::addresses::AddressRepository;
use crate::db::notifications::NotificationRepository;
use crate::db::orders::OrderRepository;
use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::models::{Address, Order};
use crate::services::favorites::{Favorite, FavoritesService};
use crate::state::AppState;

/// Number of recent orders and favorites shown.
const SUMMARY_SIZE: u32 = 3;

/// Everything the home screen shows.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub full_name: String,
    pub wallet_balance: Money,
    pub unread_notifications: u64,
    pub recent_orders: Vec<Order>,
    pub favorites: Vec<Favorite>,
    pub default_address: Option<Address>,
}

/// Build the dashboard for `user_id`.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the account no longer exists, or any
/// error from the underlying queries.
#[tracing::instrument(skip(state))]
pub async fn load(state: &AppState, user_id: UserId) -> Result<Dashboard> {
    let pool = state.pool();
    let menu = state.menu().all().await?;

    let (user, unread, recent_orders, favorites, default_address) = tokio::try_join!(
        async { Ok::<_, AppError>(UserRepository::new(pool).get_by_id(user_id).await?) },
        async { Ok::<_, AppError>(NotificationRepository::new(pool).unread_count(user_id).await?) },
        async {
            Ok::<_, AppError>(
                OrderRepository::new(pool)
                    .list_for_user(user_id, SUMMARY_SIZE, 0)
                    .await?,
            )
        },
        async {
            FavoritesService::new(pool)
                .top(user_id, Some(SUMMARY_SIZE), &menu)
                .await
        },
        async { Ok::<_, AppError>(AddressRepository::new(pool).get_default(user_id).await?) },
    )?;

    let user = user.ok_or_else(|| AppError::NotFound("Account not found".to_owned()))?;

    Ok(Dashboard {
        full_name: user.full_name,
        wallet_balance: user.wallet_balance,
        unread_notifications: unread,
        recent_orders,
        favorites,
        default_address,
    })
}
