//! Pooled order record.

use crate::pool::SlotIndex;
use lob_types::{OrderId, OrderStatus, OrderType, Price, Quantity, Side, Timestamp};

/// A live order.
///
/// Records are owned by the slab pool; the book and the engine address them
/// through `SlotIndex` handles. The `prev`/`next` links thread the FIFO of
/// the price level the order rests in and are meaningless while unlinked.
#[derive(Debug)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub order_type: OrderType,
    pub price: Price,
    pub quantity: Quantity,
    pub filled_quantity: Quantity,
    pub timestamp: Timestamp,
    pub status: OrderStatus,

    pub(crate) prev: Option<SlotIndex>,
    pub(crate) next: Option<SlotIndex>,
}

impl Default for Order {
    fn default() -> Self {
        Self {
            id: OrderId::new(0),
            side: Side::Buy,
            order_type: OrderType::Limit,
            price: Price::ZERO,
            quantity: Quantity::ZERO,
            filled_quantity: Quantity::ZERO,
            timestamp: 0,
            status: OrderStatus::New,
            prev: None,
            next: None,
        }
    }
}

impl Order {
    /// Unfilled quantity
    pub fn remaining(&self) -> Quantity {
        self.quantity - self.filled_quantity
    }

    /// Check if the order is completely filled
    pub fn is_filled(&self) -> bool {
        self.filled_quantity >= self.quantity
    }

    /// Apply a fill and advance the status.
    ///
    /// # Panics
    /// Panics if the fill would exceed the order quantity.
    pub(crate) fn fill(&mut self, quantity: Quantity) {
        let new_filled = self.filled_quantity + quantity;
        assert!(
            new_filled <= self.quantity,
            "fill would exceed order quantity"
        );

        self.filled_quantity = new_filled;
        self.status = if self.is_filled() {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(quantity: u64) -> Order {
        Order {
            id: OrderId::new(1),
            quantity: Quantity::new(quantity),
            ..Order::default()
        }
    }

    #[test]
    fn test_remaining() {
        let mut o = order(10);
        assert_eq!(o.remaining(), Quantity::new(10));

        o.fill(Quantity::new(4));
        assert_eq!(o.remaining(), Quantity::new(6));
        assert_eq!(o.status, OrderStatus::PartiallyFilled);
        assert!(!o.is_filled());
    }

    #[test]
    fn test_fill_to_completion() {
        let mut o = order(5);
        o.fill(Quantity::new(5));
        assert!(o.is_filled());
        assert_eq!(o.status, OrderStatus::Filled);
        assert!(o.remaining().is_zero());
    }

    #[test]
    #[should_panic(expected = "fill would exceed order quantity")]
    fn test_overfill_panics() {
        let mut o = order(5);
        o.fill(Quantity::new(6));
    }
}
