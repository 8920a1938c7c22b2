//! Checkout: turning a session cart into a placed order.
//!
//! Prices are re-read from the database, not the menu cache, so a customer
//! always pays the current price.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use forkful_core::{AddressId, Money, PaymentMethod, UserId};

use crate::db::addresses::AddressRepository;
use crate::db::menu::MenuRepository;
use crate::db::orders::OrderRepository;
use crate::db::wallet::WalletRepository;
use crate::error::{AppError, Result};
use crate::models::{Address, Cart, NewNotification, NewOrder, NewOrderItem, Order};
use crate::services::cart::{PricedCart, UnavailableLine, price_cart};
use crate::services::notifications::NotificationService;
use crate::state::AppState;
use crate::validation::{ValidationError, optional_text};

/// Longest delivery note, in characters.
pub const MAX_NOTES_LENGTH: usize = 500;

/// Checkout form.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    /// Saved address to deliver to; the default address when omitted.
    #[serde(default)]
    pub address_id: Option<AddressId>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub notes: Option<String>,
}

/// What the customer sees before confirming.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutQuote {
    pub cart: PricedCart,
    pub address: Option<Address>,
    pub wallet_balance: Money,
    pub can_pay_with_wallet: bool,
}

/// Checkout service.
pub struct CheckoutService<'a> {
    state: &'a AppState,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Price the cart with current prices and pick the delivery address.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if `address_id` isn't one of the user's
    /// addresses.
    #[instrument(skip(self, cart))]
    pub async fn quote(
        &self,
        user_id: UserId,
        cart: &Cart,
        address_id: Option<AddressId>,
    ) -> Result<CheckoutQuote> {
        let priced = self.price(cart).await?;
        let address = self.resolve_address(user_id, address_id).await?;
        let wallet_balance = WalletRepository::new(self.state.pool())
            .balance(user_id)
            .await?;

        Ok(CheckoutQuote {
            can_pay_with_wallet: wallet_balance >= priced.totals.total,
            cart: priced,
            address,
            wallet_balance,
        })
    }

    /// Place an order for everything in the cart.
    ///
    /// The caller clears the cart once this succeeds.
    ///
    /// # Errors
    ///
    /// - `AppError::Validation` for an empty cart, unavailable dishes, a
    ///   missing address, or notes that are too long
    /// - `AppError::Pricing` if the subtotal is below the minimum order
    /// - `AppError::NotFound` if `address_id` isn't one of the user's
    /// - `RepositoryError::InsufficientFunds` for a wallet payment the balance
    ///   does not cover
    #[instrument(skip(self, cart, request), fields(payment_method = %request.payment_method))]
    pub async fn place(
        &self,
        user_id: UserId,
        cart: &Cart,
        request: &CheckoutRequest,
    ) -> Result<Order> {
        if cart.is_empty() {
            return Err(ValidationError::new("cart", "Your cart is empty").into());
        }
        let notes = optional_text("notes", request.notes.as_deref(), MAX_NOTES_LENGTH)?;

        let priced = self.price(cart).await?;
        if !priced.unavailable.is_empty() {
            return Err(ValidationError::new(
                "cart",
                format!(
                    "Some dishes are no longer available: {}",
                    describe(&priced.unavailable)
                ),
            )
            .into());
        }
        self.state
            .config()
            .delivery
            .check_minimum(&priced.totals)?;

        let address = self
            .resolve_address(user_id, request.address_id)
            .await?
            .ok_or_else(|| {
                ValidationError::new("address_id", "Add a delivery address before checking out")
            })?;

        let new_order = NewOrder {
            user_id,
            items: priced
                .lines
                .iter()
                .map(|line| NewOrderItem {
                    menu_item_id: line.item_id,
                    name: line.name.clone(),
                    unit_price: line.unit_price,
                    quantity: line.quantity,
                })
                .collect(),
            totals: priced.totals,
            payment_method: request.payment_method,
            delivery_address: address.snapshot(),
            notes,
        };

        let order = OrderRepository::new(self.state.pool())
            .place(&new_order)
            .await?;

        tracing::info!(order_id = %order.id, total = %order.totals.total, "Order placed");

        NotificationService::new(self.state.pool())
            .notify_best_effort(
                user_id,
                &NewNotification::order_placed(order.id, order.totals.total),
            )
            .await;

        Ok(order)
    }

    async fn price(&self, cart: &Cart) -> Result<PricedCart> {
        let ids: Vec<_> = cart.lines.iter().map(|line| line.item_id).collect();
        let items = MenuRepository::new(self.state.pool()).get_many(&ids).await?;
        Ok(price_cart(cart, &items, &self.state.config().delivery)?)
    }

    async fn resolve_address(
        &self,
        user_id: UserId,
        address_id: Option<AddressId>,
    ) -> Result<Option<Address>> {
        let addresses = AddressRepository::new(self.state.pool());
        match address_id {
            Some(id) => addresses
                .get(user_id, id)
                .await?
                .map(Some)
                .ok_or_else(|| AppError::NotFound("Address not found".to_owned())),
            None => Ok(addresses.get_default(user_id).await?),
        }
    }
}

fn describe(lines: &[UnavailableLine]) -> String {
    lines
        .iter()
        .map(|line| {
            line.name
                .clone()
                .unwrap_or_else(|| format!("dish #{}", line.item_id))
        })
        .collect::<Vec<_>>()
        .join(", ")
}
