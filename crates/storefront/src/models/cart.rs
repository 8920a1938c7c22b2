//! Session-stored shopping cart.
//!
//! The cart holds only dish IDs and quantities. Names and prices are looked
//! up from the menu whenever the cart is shown, so a price change is picked
//! up before checkout.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use forkful_core::MenuItemId;

/// Largest quantity of one dish per cart line.
pub const MAX_LINE_QUANTITY: u32 = 20;

/// Largest number of distinct dishes in one cart.
pub const MAX_LINES: usize = 50;

/// Errors from cart edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("Quantity must be between 1 and {MAX_LINE_QUANTITY}")]
    InvalidQuantity,
    #[error("A cart can hold at most {MAX_LINES} different dishes")]
    TooManyLines,
    #[error("That dish is not in your cart")]
    NotInCart,
}

/// One dish in the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub item_id: MenuItemId,
    pub quantity: u32,
}

/// A shopping cart. Lines keep the order dishes were first added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of dishes.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0_u32, |acc, line| acc.saturating_add(line.quantity))
    }

    /// Quantity of `item_id` in the cart, or zero.
    #[must_use]
    pub fn quantity_of(&self, item_id: MenuItemId) -> u32 {
        self.lines
            .iter()
            .find(|line| line.item_id == item_id)
            .map_or(0, |line| line.quantity)
    }

    /// Add `quantity` of a dish, merging with an existing line.
    ///
    /// A merged line is capped at [`MAX_LINE_QUANTITY`]. Returns the line's
    /// new quantity.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] for a zero or oversized
    /// `quantity` and [`CartError::TooManyLines`] when a new line would not fit.
    pub fn add(&mut self, item_id: MenuItemId, quantity: u32) -> Result<u32, CartError> {
        if !(1..=MAX_LINE_QUANTITY).contains(&quantity) {
            return Err(CartError::InvalidQuantity);
        }

        if let Some(line) = self.lines.iter_mut().find(|line| line.item_id == item_id) {
            line.quantity = line.quantity.saturating_add(quantity).min(MAX_LINE_QUANTITY);
            return Ok(line.quantity);
        }

        if self.lines.len() >= MAX_LINES {
            return Err(CartError::TooManyLines);
        }
        self.lines.push(CartLine { item_id, quantity });
        Ok(quantity)
    }

    /// Set the quantity of a dish already in the cart. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] above [`MAX_LINE_QUANTITY`] and
    /// [`CartError::NotInCart`] if the dish is not in the cart.
    pub fn set_quantity(&mut self, item_id: MenuItemId, quantity: u32) -> Result<(), CartError> {
        if quantity > MAX_LINE_QUANTITY {
            return Err(CartError::InvalidQuantity);
        }
        if quantity == 0 {
            return self.remove(item_id);
        }
        let line = self
            .lines
            .iter_mut()
            .find(|line| line.item_id == item_id)
            .ok_or(CartError::NotInCart)?;
        line.quantity = quantity;
        Ok(())
    }

    /// Remove a dish.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] if the dish is not in the cart.
    pub fn remove(&mut self, item_id: MenuItemId) -> Result<(), CartError> {
        let before = self.lines.len();
        self.lines.retain(|line| line.item_id != item_id);
        if self.lines.len() == before {
            return Err(CartError::NotInCart);
        }
        Ok(())
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn id(n: i32) -> MenuItemId {
        MenuItemId::new(n)
    }

    #[test]
    fn test_add_merges_and_caps() {
        let mut cart = Cart::default();
        assert_eq!(cart.add(id(1), 2).unwrap(), 2);
        assert_eq!(cart.add(id(1), 3).unwrap(), 5);
        assert_eq!(cart.add(id(1), 20).unwrap(), MAX_LINE_QUANTITY);
        assert_eq!(cart.lines.len(), 1);
    }

    #[test]
    fn test_add_rejects_bad_quantity() {
        let mut cart = Cart::default();
        assert_eq!(cart.add(id(1), 0), Err(CartError::InvalidQuantity));
        assert_eq!(cart.add(id(1), 21), Err(CartError::InvalidQuantity));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_keeps_insertion_order() {
        let mut cart = Cart::default();
        cart.add(id(3), 1).unwrap();
        cart.add(id(1), 1).unwrap();
        cart.add(id(3), 1).unwrap();
        assert_eq!(cart.lines[0].item_id, id(3));
        assert_eq!(cart.lines[1].item_id, id(1));
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_line_limit() {
        let mut cart = Cart::default();
        for n in 0..50 {
            cart.add(id(n), 1).unwrap();
        }
        assert_eq!(cart.add(id(99), 1), Err(CartError::TooManyLines));
        // Merging into an existing line still works at the limit.
        assert_eq!(cart.add(id(0), 1).unwrap(), 2);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = Cart::default();
        cart.add(id(1), 4).unwrap();
        cart.set_quantity(id(1), 2).unwrap();
        assert_eq!(cart.quantity_of(id(1)), 2);
        cart.set_quantity(id(1), 0).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.set_quantity(id(1), 1), Err(CartError::NotInCart));
        assert_eq!(cart.set_quantity(id(1), 21), Err(CartError::InvalidQuantity));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::default();
        cart.add(id(1), 1).unwrap();
        cart.add(id(2), 1).unwrap();
        cart.remove(id(1)).unwrap();
        assert_eq!(cart.remove(id(1)), Err(CartError::NotInCart));
        cart.clear();
        assert!(cart.is_empty());
    }
}
