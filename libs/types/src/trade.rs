//! Trade execution records.

use crate::ids::OrderId;
use crate::numeric::{Price, Quantity, Timestamp};
use serde::{Deserialize, Serialize};

/// An executed match between a buy order and a sell order.
///
/// The price is always the resting order's posted price. `sequence` is a
/// per-engine monotonic counter assigned in execution order, so trades can
/// be totally ordered even when timestamps collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub sequence: u64,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub price: Price,
    pub quantity: Quantity,
    pub timestamp: Timestamp,
}

impl Trade {
    /// Create a new trade record
    pub fn new(
        sequence: u64,
        buy_order_id: OrderId,
        sell_order_id: OrderId,
        price: Price,
        quantity: Quantity,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            sequence,
            buy_order_id,
            sell_order_id,
            price,
            quantity,
            timestamp,
        }
    }

    /// Trade value in ticks (price × quantity), widened to avoid overflow
    pub fn notional(&self) -> i128 {
        self.price.ticks() as i128 * self.quantity.raw() as i128
    }
}
