//! Order pricing: subtotal, delivery fee, and minimum order rules.

use serde::{Deserialize, Serialize};

use crate::Money;

/// Errors from pricing a basket.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    /// An amount did not fit in 64 bits.
    #[error("order total is too large")]
    Overflow,
    /// The subtotal is below the kitchen's minimum order value.
    #[error("minimum order is {minimum}, basket is {subtotal}")]
    BelowMinimum {
        /// Configured minimum subtotal.
        minimum: Money,
        /// Subtotal of the basket.
        subtotal: Money,
    },
}

/// Delivery charges and order minimums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryPolicy {
    /// Flat delivery fee charged per order.
    pub delivery_fee: Money,
    /// Subtotal at or above which delivery is free. `None` disables free delivery.
    pub free_delivery_threshold: Option<Money>,
    /// Smallest subtotal accepted at checkout.
    pub minimum_order: Money,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            delivery_fee: Money::from_minor(299),
            free_delivery_threshold: Some(Money::from_minor(2500)),
            minimum_order: Money::from_minor(1000),
        }
    }
}

/// Computed totals for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub total: Money,
}

impl OrderTotals {
    /// Totals of an empty basket.
    pub const EMPTY: Self = Self {
        subtotal: Money::ZERO,
        delivery_fee: Money::ZERO,
        total: Money::ZERO,
    };
}

/// Sum `unit_price * quantity` over the given lines.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if any product or the sum overflows.
pub fn subtotal<I>(lines: I) -> Result<Money, PricingError>
where
    I: IntoIterator<Item = (Money, u32)>,
{
    lines.into_iter().try_fold(Money::ZERO, |acc, (price, qty)| {
        price
            .checked_mul(qty)
            .and_then(|line| acc.checked_add(line))
            .ok_or(PricingError::Overflow)
    })
}

impl DeliveryPolicy {
    /// Delivery fee for a basket with the given subtotal.
    ///
    /// Empty baskets are not charged; baskets at or above the free delivery
    /// threshold are not charged.
    #[must_use]
    pub fn delivery_fee_for(&self, subtotal: Money) -> Money {
        if subtotal.is_zero() {
            return Money::ZERO;
        }
        match self.free_delivery_threshold {
            Some(threshold) if subtotal >= threshold => Money::ZERO,
            _ => self.delivery_fee,
        }
    }

    /// Compute totals for a subtotal.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if the total overflows.
    pub fn quote(&self, subtotal: Money) -> Result<OrderTotals, PricingError> {
        let delivery_fee = self.delivery_fee_for(subtotal);
        let total = subtotal
            .checked_add(delivery_fee)
            .ok_or(PricingError::Overflow)?;
        Ok(OrderTotals {
            subtotal,
            delivery_fee,
            total,
        })
    }

    /// Reject totals below the minimum order value.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::BelowMinimum`] when the subtotal is too small.
    pub fn check_minimum(&self, totals: &OrderTotals) -> Result<(), PricingError> {
        if totals.subtotal < self.minimum_order {
            return Err(PricingError::BelowMinimum {
                minimum: self.minimum_order,
                subtotal: totals.subtotal,
            });
        }
        Ok(())
    }

    /// How much more the customer must add to qualify for free delivery.
    #[must_use]
    pub fn remaining_for_free_delivery(&self, subtotal: Money) -> Option<Money> {
        let threshold = self.free_delivery_threshold?;
        threshold.checked_sub(subtotal).filter(|m| m.minor() > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn m(minor: i64) -> Money {
        Money::from_minor(minor)
    }

    #[test]
    fn test_subtotal() {
        let lines = [(m(899), 2), (m(350), 1)];
        assert_eq!(subtotal(lines).unwrap(), m(2148));
        assert_eq!(subtotal(Vec::<(Money, u32)>::new()).unwrap(), Money::ZERO);
    }

    #[test]
    fn test_subtotal_overflow() {
        assert_eq!(
            subtotal([(m(i64::MAX), 2)]),
            Err(PricingError::Overflow)
        );
        assert_eq!(
            subtotal([(m(i64::MAX), 1), (m(1), 1)]),
            Err(PricingError::Overflow)
        );
    }

    #[test]
    fn test_quote_charges_delivery_below_threshold() {
        let policy = DeliveryPolicy::default();
        let totals = policy.quote(m(1500)).unwrap();
        assert_eq!(totals.delivery_fee, m(299));
        assert_eq!(totals.total, m(1799));
    }

    #[test]
    fn test_quote_free_delivery_at_threshold() {
        let policy = DeliveryPolicy::default();
        let totals = policy.quote(m(2500)).unwrap();
        assert_eq!(totals.delivery_fee, Money::ZERO);
        assert_eq!(totals.total, m(2500));
    }

    #[test]
    fn test_quote_empty_basket_is_free() {
        let totals = DeliveryPolicy::default().quote(Money::ZERO).unwrap();
        assert_eq!(totals, OrderTotals::EMPTY);
    }

    #[test]
    fn test_no_threshold_always_charges() {
        let policy = DeliveryPolicy {
            free_delivery_threshold: None,
            ..DeliveryPolicy::default()
        };
        assert_eq!(policy.delivery_fee_for(m(100_000)), m(299));
        assert_eq!(policy.remaining_for_free_delivery(m(100)), None);
    }

    #[test]
    fn test_minimum_order() {
        let policy = DeliveryPolicy::default();
        let small = policy.quote(m(999)).unwrap();
        assert_eq!(
            policy.check_minimum(&small),
            Err(PricingError::BelowMinimum {
                minimum: m(1000),
                subtotal: m(999)
            })
        );
        let ok = policy.quote(m(1000)).unwrap();
        assert!(policy.check_minimum(&ok).is_ok());
    }

    #[test]
    fn test_remaining_for_free_delivery() {
        let policy = DeliveryPolicy::default();
        assert_eq!(policy.remaining_for_free_delivery(m(2000)), Some(m(500)));
        assert_eq!(policy.remaining_for_free_delivery(m(2500)), None);
        assert_eq!(policy.remaining_for_free_delivery(m(9000)), None);
    }
}
