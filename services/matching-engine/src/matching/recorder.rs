//! Trade recording and delivery.
//!
//! Trades are appended to an unbounded buffer and, when a callback is
//! installed, delivered synchronously in generation order before the next
//! trade is produced. The callback must not call back into the engine.

use lob_types::{OrderId, Price, Quantity, Timestamp, Trade};
use tracing::trace;

/// Subscriber invoked once per trade, inline during matching.
pub type TradeCallback = Box<dyn FnMut(&Trade) + Send>;

/// Buffers executed trades and hands out monotonic sequence numbers.
pub struct TradeRecorder {
    trades: Vec<Trade>,
    next_sequence: u64,
    callback: Option<TradeCallback>,
}

impl TradeRecorder {
    pub fn new() -> Self {
        Self {
            trades: Vec::new(),
            next_sequence: 0,
            callback: None,
        }
    }

    pub fn with_callback(callback: TradeCallback) -> Self {
        Self {
            callback: Some(callback),
            ..Self::new()
        }
    }

    /// Get next sequence number (monotonically increasing)
    fn next_sequence(&mut self) -> u64 {
        let seq = self.next_sequence;
        self.next_sequence += 1;
        seq
    }

    /// Record one execution, notifying the subscriber before returning.
    pub fn record(
        &mut self,
        buy_order_id: OrderId,
        sell_order_id: OrderId,
        price: Price,
        quantity: Quantity,
        timestamp: Timestamp,
    ) {
        let sequence = self.next_sequence();
        let trade = Trade::new(
            sequence,
            buy_order_id,
            sell_order_id,
            price,
            quantity,
            timestamp,
        );

        trace!(
            sequence,
            buy = %buy_order_id,
            sell = %sell_order_id,
            price = %price,
            quantity = %quantity,
            "trade executed"
        );

        if let Some(callback) = &mut self.callback {
            callback(&trade);
        }
        self.trades.push(trade);
    }

    /// Take the accumulated trades, leaving the buffer empty.
    pub fn drain(&mut self) -> Vec<Trade> {
        std::mem::take(&mut self.trades)
    }

    /// Trades recorded since the last drain
    pub fn pending(&self) -> usize {
        self.trades.len()
    }
}

impl Default for TradeRecorder {
    fn default() -> Self {
        Self::new()
    }
}
