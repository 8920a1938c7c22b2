//! Wallet operations for support staff.

use forkful_core::{Email, Money};
use forkful_storefront::db::users::UserRepository;
use forkful_storefront::db::wallet::WalletRepository;
use forkful_storefront::models::NewNotification;
use forkful_storefront::services::notifications::NotificationService;

use super::{CliError, connect};

/// Parse a credit amount in pence.
///
/// # Errors
///
/// Returns `CliError::Invalid` unless the amount is positive.
pub fn parse_amount(pence: i64) -> Result<Money, CliError> {
    if pence <= 0 {
        return Err(CliError::Invalid(format!(
            "Amount must be a positive number of pence, got {pence}"
        )));
    }
    Ok(Money::from_minor(pence))
}

/// Credit a customer's wallet. Support credits ignore the top-up limits.
///
/// # Errors
///
/// Returns `CliError::Invalid` for a bad email, amount, or unknown customer.
pub async fn credit(email: &str, pence: i64) -> Result<(), CliError> {
    let email = Email::parse(email).map_err(|e| CliError::Invalid(e.to_string()))?;
    let amount = parse_amount(pence)?;

    let pool = connect().await?;

    let user = UserRepository::new(&pool)
        .get_by_email(&email)
        .await?
        .ok_or_else(|| CliError::Invalid(format!("No customer with email {email}")))?;

    let transaction = WalletRepository::new(&pool)
        .credit(user.id, amount, None, "Goodwill credit")
        .await?;

    tracing::info!(
        user_id = %user.id,
        amount = %amount,
        balance = %transaction.balance_after,
        "Wallet credited"
    );

    NotificationService::new(&pool)
        .notify_best_effort(
            user.id,
            &NewNotification::wallet_credited(amount, transaction.balance_after),
        )
        .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(500).ok(), Some(Money::from_minor(500)));
        assert!(parse_amount(0).is_err());
        assert!(parse_amount(-100).is_err());
    }
}
