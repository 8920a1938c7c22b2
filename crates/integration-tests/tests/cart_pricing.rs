//! Cart edits priced against a menu.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use forkful_core::{DeliveryPolicy, MenuItemId, Money, PricingError};
use forkful_integration_tests::{menu_item, policy};
use forkful_storefront::models::cart::MAX_LINE_QUANTITY;
use forkful_storefront::models::{Cart, CartError, MenuItem};
use forkful_storefront::services::cart::{UnavailableReason, price_cart};

fn menu() -> Vec<MenuItem> {
    vec![
        menu_item(1, "Katsu Curry", 1095, true),
        menu_item(2, "Gyoza", 550, true),
        menu_item(3, "Mochi", 395, false),
    ]
}

fn id(n: i32) -> MenuItemId {
    MenuItemId::new(n)
}

#[test]
fn test_adding_existing_dish_merges_and_caps() {
    let mut cart = Cart::default();
    assert_eq!(cart.add(id(1), 15).unwrap(), 15);
    assert_eq!(cart.add(id(1), 10).unwrap(), MAX_LINE_QUANTITY);
    assert_eq!(cart.lines.len(), 1);
    assert_eq!(cart.item_count(), MAX_LINE_QUANTITY);
}

#[test]
fn test_setting_zero_removes() {
    let mut cart = Cart::default();
    cart.add(id(1), 2).unwrap();
    cart.add(id(2), 1).unwrap();

    cart.set_quantity(id(1), 0).unwrap();
    assert_eq!(cart.quantity_of(id(1)), 0);
    assert_eq!(cart.lines.len(), 1);

    assert_eq!(cart.set_quantity(id(9), 1), Err(CartError::NotInCart));
    assert_eq!(cart.add(id(2), 0), Err(CartError::InvalidQuantity));
}

#[test]
fn test_free_delivery_at_threshold() {
    // 2 x 1095 + 550 = 2740, above the 2500 threshold.
    let mut cart = Cart::default();
    cart.add(id(1), 2).unwrap();
    cart.add(id(2), 1).unwrap();

    let priced = price_cart(&cart, &menu(), &policy()).unwrap();
    assert_eq!(priced.totals.subtotal, Money::from_minor(2740));
    assert_eq!(priced.totals.delivery_fee, Money::ZERO);
    assert_eq!(priced.totals.total, Money::from_minor(2740));
    assert_eq!(priced.remaining_for_free_delivery, None);
    assert!(priced.is_orderable());

    // Exactly at the threshold is free too.
    let exact = DeliveryPolicy {
        free_delivery_threshold: Some(Money::from_minor(2740)),
        ..policy()
    };
    let priced = price_cart(&cart, &menu(), &exact).unwrap();
    assert_eq!(priced.totals.delivery_fee, Money::ZERO);
}

#[test]
fn test_below_threshold_pays_delivery() {
    let mut cart = Cart::default();
    cart.add(id(1), 1).unwrap();

    let priced = price_cart(&cart, &menu(), &policy()).unwrap();
    assert_eq!(priced.totals.delivery_fee, Money::from_minor(299));
    assert_eq!(priced.totals.total, Money::from_minor(1394));
    assert_eq!(
        priced.remaining_for_free_delivery,
        Some(Money::from_minor(1405))
    );
    assert!(priced.meets_minimum);
}

#[test]
fn test_minimum_order() {
    let mut cart = Cart::default();
    cart.add(id(2), 1).unwrap();

    let priced = price_cart(&cart, &menu(), &policy()).unwrap();
    assert!(!priced.meets_minimum);
    assert!(!priced.is_orderable());

    let err = policy().check_minimum(&priced.totals).unwrap_err();
    assert_eq!(
        err,
        PricingError::BelowMinimum {
            minimum: Money::from_minor(1000),
            subtotal: Money::from_minor(550),
        }
    );
}

#[test]
fn test_unavailable_lines_excluded() {
    let mut cart = Cart::default();
    cart.add(id(1), 1).unwrap();
    cart.add(id(3), 2).unwrap();
    cart.add(id(42), 1).unwrap();

    let priced = price_cart(&cart, &menu(), &policy()).unwrap();
    assert_eq!(priced.lines.len(), 1);
    assert_eq!(priced.totals.subtotal, Money::from_minor(1095));
    assert_eq!(priced.item_count, 1);

    assert_eq!(priced.unavailable.len(), 2);
    assert_eq!(priced.unavailable[0].reason, UnavailableReason::SoldOut);
    assert_eq!(priced.unavailable[0].name.as_deref(), Some("Mochi"));
    assert_eq!(priced.unavailable[1].reason, UnavailableReason::Removed);
    assert_eq!(priced.unavailable[1].name, None);
    assert!(!priced.is_orderable());
}

#[test]
fn test_overflow_detected() {
    let menu = vec![menu_item(1, "Gold Leaf Platter", i64::MAX / 2, true)];
    let mut cart = Cart::default();
    cart.add(id(1), 3).unwrap();

    assert_eq!(
        price_cart(&cart, &menu, &policy()).unwrap_err(),
        PricingError::Overflow
    );
}

#[test]
fn test_empty_cart_is_free_and_not_orderable() {
    let priced = price_cart(&Cart::default(), &menu(), &policy()).unwrap();
    assert_eq!(priced.totals.total, Money::ZERO);
    assert_eq!(priced.remaining_for_free_delivery, None);
    assert!(!priced.is_orderable());
}

#[test]
fn test_priced_cart_json_shape() {
    let mut cart = Cart::default();
    cart.add(id(1), 1).unwrap();
    let priced = price_cart(&cart, &menu(), &policy()).unwrap();
    let json = serde_json::to_value(&priced).unwrap();

    assert_eq!(json["subtotal"], 1095);
    assert_eq!(json["delivery_fee"], 299);
    assert_eq!(json["lines"][0]["name"], "Katsu Curry");
    assert!(json.get("totals").is_none());
}
