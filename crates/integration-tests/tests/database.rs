//! Invariants that live in SQL: wallet debits, refunds, and default addresses.
//!
//! These tests require:
//! - A running `PostgreSQL` database (`FORKFUL_TEST_DATABASE_URL`, defaulting
//!   to `postgres://forkful@localhost/forkful_test`)
//!
//! Run with: `cargo test -p forkful-integration-tests --test database -- --ignored`
//!
//! Every test creates its own customer, so the suite can share one database
//! and run in parallel.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use forkful_core::{
    Email, Money, OrderStatus, OrderTotals, PaymentMethod, PaymentStatus, UserId,
    WalletTransactionKind,
};
use forkful_integration_tests::test_database_url;
use forkful_storefront::db::addresses::AddressRepository;
use forkful_storefront::db::menu::MenuRepository;
use forkful_storefront::db::orders::OrderRepository;
use forkful_storefront::db::users::UserRepository;
use forkful_storefront::db::wallet::WalletRepository;
use forkful_storefront::db::{MIGRATOR, RepositoryError};
use forkful_storefront::models::{
    AddressInput, DeliveryAddress, MenuItem, NewMenuItem, NewOrder, NewOrderItem,
};

static COUNTER: AtomicU32 = AtomicU32::new(0);

/// A name no other test run has used.
fn unique(prefix: &str) -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("{prefix}-{}-{nanos}-{n}", std::process::id())
}

async fn pool() -> PgPool {
    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&test_database_url())
        .await
        .expect("Failed to connect to test database");
    MIGRATOR.run(&pool).await.expect("Failed to run migrations");
    pool
}

async fn customer(pool: &PgPool) -> UserId {
    let email = Email::parse(&format!("{}@forkful.test", unique("diner"))).unwrap();
    UserRepository::new(pool)
        .create_with_password(&email, "Test Diner", "$argon2id$placeholder")
        .await
        .unwrap()
        .id
}

async fn top_up(pool: &PgPool, user_id: UserId, pence: i64) {
    WalletRepository::new(pool)
        .credit(user_id, Money::from_minor(pence), None, "Test funds")
        .await
        .unwrap();
}

async fn dish(pool: &PgPool, price: i64) -> MenuItem {
    MenuRepository::new(pool)
        .insert(&NewMenuItem {
            name: unique("Katsu Curry"),
            description: None,
            price: Money::from_minor(price),
            category: "Mains".to_owned(),
            image_url: None,
            available: true,
        })
        .await
        .unwrap()
}

fn wallet_order(user_id: UserId, item: &MenuItem, quantity: u32) -> NewOrder {
    let subtotal = item.price.checked_mul(quantity).unwrap();
    NewOrder {
        user_id,
        items: vec![NewOrderItem {
            menu_item_id: item.id,
            name: item.name.clone(),
            unit_price: item.price,
            quantity,
        }],
        totals: OrderTotals {
            subtotal,
            delivery_fee: Money::ZERO,
            total: subtotal,
        },
        payment_method: PaymentMethod::Wallet,
        delivery_address: DeliveryAddress {
            label: "Home".to_owned(),
            line1: "1 High Street".to_owned(),
            line2: None,
            city: "London".to_owned(),
            postcode: "SW1A 1AA".to_owned(),
            phone: None,
            instructions: None,
        },
        notes: None,
    }
}

fn address(label: &str) -> AddressInput {
    AddressInput {
        label: label.to_owned(),
        line1: format!("{label} House"),
        line2: None,
        city: "Leeds".to_owned(),
        postcode: "LS1 4AP".to_owned(),
        phone: None,
        instructions: None,
    }
}

async fn default_count(pool: &PgPool, user_id: UserId) -> usize {
    AddressRepository::new(pool)
        .list(user_id)
        .await
        .unwrap()
        .iter()
        .filter(|a| a.is_default)
        .count()
}

// ============================================================================
// Wallet payments
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_failed_wallet_payment_writes_nothing() {
    let pool = pool().await;
    let user_id = customer(&pool).await;
    top_up(&pool, user_id, 1000).await;
    let item = dish(&pool, 750).await;

    let result = OrderRepository::new(&pool)
        .place(&wallet_order(user_id, &item, 2))
        .await;

    assert!(matches!(result, Err(RepositoryError::InsufficientFunds)));
    let wallet = WalletRepository::new(&pool);
    assert_eq!(wallet.balance(user_id).await.unwrap(), Money::from_minor(1000));
    assert_eq!(wallet.transactions(user_id, 10).await.unwrap().len(), 1);
    assert_eq!(
        OrderRepository::new(&pool)
            .count_for_user(user_id)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_concurrent_wallet_payments_never_overdraw() {
    let pool = pool().await;
    let user_id = customer(&pool).await;
    top_up(&pool, user_id, 1000).await;
    let item = dish(&pool, 700).await;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let pool = pool.clone();
            let order = wallet_order(user_id, &item, 1);
            tokio::spawn(async move { OrderRepository::new(&pool).place(&order).await })
        })
        .collect();

    let mut placed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => placed += 1,
            Err(RepositoryError::InsufficientFunds) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(placed, 1);
    assert_eq!(
        WalletRepository::new(&pool).balance(user_id).await.unwrap(),
        Money::from_minor(300)
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_cancelling_wallet_order_refunds() {
    let pool = pool().await;
    let user_id = customer(&pool).await;
    top_up(&pool, user_id, 2000).await;
    let item = dish(&pool, 750).await;
    let orders = OrderRepository::new(&pool);
    let wallet = WalletRepository::new(&pool);

    let order = orders.place(&wallet_order(user_id, &item, 2)).await.unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(wallet.balance(user_id).await.unwrap(), Money::from_minor(500));

    let change = orders.cancel(user_id, order.id).await.unwrap();

    assert_eq!(change.refunded, Some(Money::from_minor(1500)));
    assert_eq!(change.order.status, OrderStatus::Cancelled);
    assert_eq!(change.order.payment_status, PaymentStatus::Refunded);
    assert_eq!(wallet.balance(user_id).await.unwrap(), Money::from_minor(2000));

    let ledger = wallet.transactions(user_id, 10).await.unwrap();
    assert_eq!(ledger[0].kind, WalletTransactionKind::Refund);
    assert_eq!(ledger[0].amount, Money::from_minor(1500));
    assert_eq!(ledger[0].order_id, Some(order.id));
    assert_eq!(ledger[1].kind, WalletTransactionKind::OrderPayment);
    assert_eq!(ledger[1].amount, Money::from_minor(-1500));

    // A second cancel neither refunds again nor succeeds.
    assert!(matches!(
        orders.cancel(user_id, order.id).await,
        Err(RepositoryError::Conflict(_))
    ));
    assert_eq!(wallet.balance(user_id).await.unwrap(), Money::from_minor(2000));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_cancel_is_owner_scoped() {
    let pool = pool().await;
    let owner = customer(&pool).await;
    let stranger = customer(&pool).await;
    top_up(&pool, owner, 1000).await;
    let item = dish(&pool, 900).await;
    let orders = OrderRepository::new(&pool);

    let order = orders.place(&wallet_order(owner, &item, 1)).await.unwrap();

    assert!(matches!(
        orders.cancel(stranger, order.id).await,
        Err(RepositoryError::NotFound)
    ));
    assert_eq!(
        WalletRepository::new(&pool).balance(owner).await.unwrap(),
        Money::from_minor(100)
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_credit_respects_balance_ceiling() {
    let pool = pool().await;
    let user_id = customer(&pool).await;
    let wallet = WalletRepository::new(&pool);
    top_up(&pool, user_id, 900).await;

    let result = wallet
        .credit(user_id, Money::from_minor(200), Some(Money::from_minor(1000)), "Top-up")
        .await;

    assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    assert_eq!(wallet.balance(user_id).await.unwrap(), Money::from_minor(900));
}

// ============================================================================
// Default addresses
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_first_address_is_default_and_switching_keeps_one() {
    let pool = pool().await;
    let user_id = customer(&pool).await;
    let addresses = AddressRepository::new(&pool);

    let home = addresses.create(user_id, &address("Home"), 20).await.unwrap();
    let work = addresses.create(user_id, &address("Work"), 20).await.unwrap();
    assert!(home.is_default);
    assert!(!work.is_default);

    let work = addresses.set_default(user_id, work.id).await.unwrap();
    assert!(work.is_default);
    assert_eq!(default_count(&pool, user_id).await, 1);
    assert_eq!(
        addresses.get_default(user_id).await.unwrap().unwrap().id,
        work.id
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_concurrent_default_switches_leave_one_default() {
    let pool = pool().await;
    let user_id = customer(&pool).await;
    let addresses = AddressRepository::new(&pool);

    let mut ids = Vec::new();
    for label in ["Home", "Work", "Gym", "Parents"] {
        ids.push(addresses.create(user_id, &address(label), 20).await.unwrap().id);
    }

    let handles: Vec<_> = ids
        .iter()
        .map(|&id| {
            let pool = pool.clone();
            tokio::spawn(async move { AddressRepository::new(&pool).set_default(user_id, id).await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(default_count(&pool, user_id).await, 1);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_deleting_default_promotes_oldest() {
    let pool = pool().await;
    let user_id = customer(&pool).await;
    let addresses = AddressRepository::new(&pool);

    let home = addresses.create(user_id, &address("Home"), 20).await.unwrap();
    let work = addresses.create(user_id, &address("Work"), 20).await.unwrap();
    let gym = addresses.create(user_id, &address("Gym"), 20).await.unwrap();
    addresses.set_default(user_id, gym.id).await.unwrap();

    addresses.delete(user_id, gym.id).await.unwrap();

    let promoted = addresses.get_default(user_id).await.unwrap().unwrap();
    assert_eq!(promoted.id, home.id);
    assert_eq!(default_count(&pool, user_id).await, 1);

    // Deleting a non-default address leaves the default alone.
    addresses.delete(user_id, work.id).await.unwrap();
    assert_eq!(
        addresses.get_default(user_id).await.unwrap().unwrap().id,
        home.id
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL"]
async fn test_address_cap_holds_under_concurrency() {
    let pool = pool().await;
    let user_id = customer(&pool).await;
    let max = 3;

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let pool = pool.clone();
            let input = address(&format!("Flat {i}"));
            tokio::spawn(async move {
                AddressRepository::new(&pool)
                    .create(user_id, &input, max)
                    .await
            })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(RepositoryError::Conflict(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(created, max);
    assert_eq!(
        AddressRepository::new(&pool).list(user_id).await.unwrap().len(),
        max
    );
    assert_eq!(default_count(&pool, user_id).await, 1);
}
