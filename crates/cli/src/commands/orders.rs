//! Order operations for kitchen and delivery staff.

use forkful_core::{OrderId, OrderStatus};
use forkful_storefront::db::RepositoryError;
use forkful_storefront::db::orders::OrderRepository;
use forkful_storefront::models::NewNotification;
use forkful_storefront::services::notifications::NotificationService;

use super::{CliError, connect};

/// Move an order to `status` and notify the customer.
///
/// Cancelling a wallet-paid order refunds it.
///
/// # Errors
///
/// Returns `CliError::Invalid` if the order doesn't exist or cannot move to
/// `status`.
pub async fn advance(order_id: i32, status: OrderStatus) -> Result<(), CliError> {
    let pool = connect().await?;
    let id = OrderId::new(order_id);

    let change = OrderRepository::new(&pool)
        .advance_status(id, status)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => CliError::Invalid(format!("Order #{id} not found")),
            RepositoryError::Conflict(message) => CliError::Invalid(message),
            other => other.into(),
        })?;

    tracing::info!(order_id = %id, status = %change.order.status, "Order updated");
    if let Some(amount) = change.refunded {
        tracing::info!(order_id = %id, amount = %amount, "Wallet payment refunded");
    }

    let notification = if status == OrderStatus::Cancelled {
        NewNotification::order_cancelled(id, change.refunded)
    } else {
        NewNotification::order_status(id, status)
    };
    NotificationService::new(&pool)
        .notify_best_effort(change.order.user_id, &notification)
        .await;

    Ok(())
}
