//! Matching engine core
//!
//! Main coordinator for the order book and the matching loop. An incoming
//! order is first inserted at the tail of its own price level, then walked
//! against the opposing side while prices cross, always trading with the
//! head of the best opposing level at that level's posted price. What
//! happens to the residual depends on the order type.

use lob_types::{OrderId, OrderStatus, OrderType, Price, Quantity, Side, Trade};
use tracing::debug;

use crate::book::OrderBook;
use crate::matching::crossing;
use crate::matching::recorder::{TradeCallback, TradeRecorder};
use crate::pool::PoolConfig;

/// Engine construction parameters.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Sizing of the order record pool.
    pub pool: PoolConfig,
}

/// Operation counters, monotonically increasing over the engine lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub orders_submitted: u64,
    pub orders_rejected: u64,
    /// Explicit cancels plus discarded residuals of immediate orders
    pub orders_cancelled: u64,
    pub trades_executed: u64,
}

/// Single-instrument matching engine.
///
/// Not thread safe; callers serialize externally. Independent instances
/// may serve independent instruments on independent threads.
pub struct MatchingEngine {
    book: OrderBook,
    recorder: TradeRecorder,
    stats: EngineStats,
}

impl MatchingEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            book: OrderBook::with_config(config.pool),
            recorder: TradeRecorder::new(),
            stats: EngineStats::default(),
        }
    }

    /// Build an engine that delivers each trade to `callback` synchronously,
    /// in matching order, before the next trade is produced. The callback
    /// must not call back into the engine.
    pub fn with_callback(callback: TradeCallback) -> Self {
        Self {
            book: OrderBook::new(),
            recorder: TradeRecorder::with_callback(callback),
            stats: EngineStats::default(),
        }
    }

    /// Submit an order and drive it to its terminal or resting state.
    pub fn submit_order(
        &mut self,
        id: OrderId,
        side: Side,
        order_type: OrderType,
        price: Price,
        quantity: Quantity,
    ) -> OrderStatus {
        self.stats.orders_submitted += 1;

        if let Err(error) = self.book.add_order(id, side, order_type, price, quantity) {
            self.stats.orders_rejected += 1;
            debug!(%id, %error, "order rejected");
            return OrderStatus::Rejected;
        }
        debug!(%id, ?side, ?order_type, %price, %quantity, "order accepted");

        // Fill-or-kill is all or nothing: dry-run the crossable depth first
        // so a short book kills the order before any trade is emitted.
        if order_type == OrderType::Fok
            && self.book.crossable_depth(side, price, quantity) < quantity
        {
            self.book
                .cancel_order(id)
                .expect("fresh fill-or-kill order is cancellable");
            self.stats.orders_cancelled += 1;
            debug!(%id, "fill-or-kill lacked depth, killed");
            return OrderStatus::Cancelled;
        }

        self.match_cross(id, crossing::price_limit(order_type, price));
        self.settle_submission(id, order_type)
    }

    /// Cancel a resting order. False when the id is unknown or terminal.
    pub fn cancel_order(&mut self, id: OrderId) -> bool {
        match self.book.cancel_order(id) {
            Ok(()) => {
                self.stats.orders_cancelled += 1;
                debug!(%id, "order cancelled");
                true
            }
            Err(error) => {
                debug!(%id, %error, "cancel refused");
                false
            }
        }
    }

    /// Change a resting order's price or quantity. Does not re-match; a
    /// caller that wants the modified order to take liquidity cancels and
    /// resubmits instead.
    pub fn modify_order(&mut self, id: OrderId, new_price: Price, new_quantity: Quantity) -> bool {
        match self.book.modify_order(id, new_price, new_quantity) {
            Ok(()) => {
                debug!(%id, %new_price, %new_quantity, "order modified");
                true
            }
            Err(error) => {
                debug!(%id, %error, "modify refused");
                false
            }
        }
    }

    /// Read view of the book
    pub fn order_book(&self) -> &OrderBook {
        &self.book
    }

    /// Mutable view of the book
    pub fn order_book_mut(&mut self) -> &mut OrderBook {
        &mut self.book
    }

    /// Take the trades accumulated since the last drain.
    pub fn drain_trades(&mut self) -> Vec<Trade> {
        self.recorder.drain()
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Walk the opposing side while `limit` crosses the best price,
    /// trading with each level's head at the resting price.
    fn match_cross(&mut self, taker_id: OrderId, limit: Option<Price>) {
        let taker = self.book.index_of(taker_id).expect("taker is indexed");
        let taker_side = self.book.order_ref(taker).side;

        loop {
            let taker_remaining = self.book.order_ref(taker).remaining();
            if taker_remaining.is_zero() {
                break;
            }

            let best = match taker_side {
                Side::Buy => self.book.best_ask(),
                Side::Sell => self.book.best_bid(),
            };
            let Some(best) = best else { break };
            if !crossing::crosses(taker_side, limit, best) {
                break;
            }
            let Some(maker) = self.book.first_order_at_price(taker_side.opposite(), best) else {
                break;
            };

            let maker_id = self.book.order_ref(maker).id;
            let maker_remaining = self.book.order_ref(maker).remaining();
            let quantity = taker_remaining.min(maker_remaining);

            // Both orders are linked, so both level totals must track the
            // fills they just absorbed.
            self.book.order_mut(taker).fill(quantity);
            self.book.update_level_total(taker, taker_remaining);
            self.book.order_mut(maker).fill(quantity);
            self.book.update_level_total(maker, maker_remaining);

            let timestamp = self.book.now();
            let (buy_order_id, sell_order_id) = match taker_side {
                Side::Buy => (taker_id, maker_id),
                Side::Sell => (maker_id, taker_id),
            };
            self.recorder
                .record(buy_order_id, sell_order_id, best, quantity, timestamp);
            self.stats.trades_executed += 1;

            if self.book.order_ref(maker).is_filled() {
                self.book.remove_filled_order(maker);
            }
        }
    }

    /// Resolve the taker's final status and discard residuals of
    /// immediate order types.
    fn settle_submission(&mut self, id: OrderId, order_type: OrderType) -> OrderStatus {
        let idx = self.book.index_of(id).expect("taker is still indexed");
        let (filled, is_filled) = {
            let order = self.book.order_ref(idx);
            (order.filled_quantity, order.is_filled())
        };

        if is_filled {
            self.book.remove_filled_order(idx);
            return OrderStatus::Filled;
        }

        match order_type {
            OrderType::Limit => {
                if filled.is_zero() {
                    OrderStatus::New
                } else {
                    OrderStatus::PartiallyFilled
                }
            }
            OrderType::Market | OrderType::Ioc | OrderType::Fok => {
                self.book
                    .cancel_order(id)
                    .expect("unfilled residual is cancellable");
                self.stats.orders_cancelled += 1;
                if filled.is_zero() {
                    OrderStatus::Cancelled
                } else {
                    OrderStatus::PartiallyFilled
                }
            }
        }
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submit(
        engine: &mut MatchingEngine,
        id: u64,
        side: Side,
        order_type: OrderType,
        price: i64,
        qty: u64,
    ) -> OrderStatus {
        engine.submit_order(
            OrderId::new(id),
            side,
            order_type,
            Price::new(price),
            Quantity::new(qty),
        )
    }

    #[test]
    fn test_resting_order() {
        let mut engine = MatchingEngine::new();
        let status = submit(&mut engine, 1, Side::Buy, OrderType::Limit, 100, 10);

        assert_eq!(status, OrderStatus::New);
        assert_eq!(engine.order_book().best_bid(), Some(Price::new(100)));
        assert!(engine.drain_trades().is_empty());
        engine.order_book().check_invariants();
    }

    #[test]
    fn test_full_match_removes_both() {
        let mut engine = MatchingEngine::new();
        submit(&mut engine, 1, Side::Sell, OrderType::Limit, 100, 10);
        let status = submit(&mut engine, 2, Side::Buy, OrderType::Limit, 100, 10);

        assert_eq!(status, OrderStatus::Filled);
        assert_eq!(engine.order_book().order_count(), 0);

        let trades = engine.drain_trades();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].buy_order_id, OrderId::new(2));
        assert_eq!(trades[0].sell_order_id, OrderId::new(1));
        assert_eq!(trades[0].quantity, Quantity::new(10));
        engine.order_book().check_invariants();
    }

    #[test]
    fn test_partial_fill_rests_taker() {
        let mut engine = MatchingEngine::new();
        submit(&mut engine, 1, Side::Sell, OrderType::Limit, 100, 5);
        let status = submit(&mut engine, 2, Side::Buy, OrderType::Limit, 100, 10);

        assert_eq!(status, OrderStatus::PartiallyFilled);
        let taker = engine.order_book().get_order(OrderId::new(2)).unwrap();
        assert_eq!(taker.filled_quantity, Quantity::new(5));
        assert_eq!(taker.remaining(), Quantity::new(5));
        // The residual rests as the new best bid; its level total must
        // reflect only the unfilled remainder
        assert_eq!(
            engine
                .order_book()
                .depth_at_price(Side::Buy, Price::new(100)),
            Quantity::new(5)
        );
        engine.order_book().check_invariants();
    }

    #[test]
    fn test_no_cross_rests() {
        let mut engine = MatchingEngine::new();
        submit(&mut engine, 1, Side::Sell, OrderType::Limit, 101, 10);
        let status = submit(&mut engine, 2, Side::Buy, OrderType::Limit, 100, 10);

        assert_eq!(status, OrderStatus::New);
        assert_eq!(engine.order_book().order_count(), 2);
        assert!(engine.drain_trades().is_empty());
        engine.order_book().check_invariants();
    }

    #[test]
    fn test_limit_sweeps_multiple_levels() {
        let mut engine = MatchingEngine::new();
        submit(&mut engine, 1, Side::Sell, OrderType::Limit, 100, 4);
        submit(&mut engine, 2, Side::Sell, OrderType::Limit, 101, 4);
        submit(&mut engine, 3, Side::Sell, OrderType::Limit, 102, 4);

        let status = submit(&mut engine, 4, Side::Buy, OrderType::Limit, 101, 10);
        assert_eq!(status, OrderStatus::PartiallyFilled);

        let trades = engine.drain_trades();
        assert_eq!(trades.len(), 2);
        // Resting prices, best first
        assert_eq!(trades[0].price, Price::new(100));
        assert_eq!(trades[1].price, Price::new(101));

        // 2 left resting as a bid at 101, ask at 102 untouched
        assert_eq!(engine.order_book().best_bid(), Some(Price::new(101)));
        assert_eq!(engine.order_book().best_ask(), Some(Price::new(102)));
        engine.order_book().check_invariants();
    }

    #[test]
    fn test_market_ignores_price() {
        let mut engine = MatchingEngine::new();
        submit(&mut engine, 1, Side::Sell, OrderType::Limit, 105, 5);

        let status = submit(&mut engine, 2, Side::Buy, OrderType::Market, 0, 5);
        assert_eq!(status, OrderStatus::Filled);
        assert_eq!(engine.order_book().order_count(), 0);
        engine.order_book().check_invariants();
    }

    #[test]
    fn test_market_against_empty_side_cancels() {
        let mut engine = MatchingEngine::new();
        let status = submit(&mut engine, 1, Side::Buy, OrderType::Market, 0, 5);

        assert_eq!(status, OrderStatus::Cancelled);
        assert_eq!(engine.order_book().order_count(), 0);
        assert!(engine.drain_trades().is_empty());
    }

    #[test]
    fn test_market_residual_is_discarded() {
        let mut engine = MatchingEngine::new();
        submit(&mut engine, 1, Side::Sell, OrderType::Limit, 100, 3);

        let status = submit(&mut engine, 2, Side::Buy, OrderType::Market, 0, 10);
        assert_eq!(status, OrderStatus::PartiallyFilled);
        // Nothing rests on either side
        assert_eq!(engine.order_book().order_count(), 0);
        engine.order_book().check_invariants();
    }

    #[test]
    fn test_ioc_honours_limit() {
        let mut engine = MatchingEngine::new();
        submit(&mut engine, 1, Side::Sell, OrderType::Limit, 101, 5);

        // No crossing price: cancelled outright, nothing rests
        let status = submit(&mut engine, 2, Side::Buy, OrderType::Ioc, 100, 5);
        assert_eq!(status, OrderStatus::Cancelled);
        assert_eq!(engine.order_book().order_count(), 1);
        assert!(engine.drain_trades().is_empty());
        engine.order_book().check_invariants();
    }

    #[test]
    fn test_fok_insufficient_depth_emits_nothing() {
        let mut engine = MatchingEngine::new();
        submit(&mut engine, 1, Side::Sell, OrderType::Limit, 100, 5);

        let status = submit(&mut engine, 2, Side::Buy, OrderType::Fok, 100, 10);
        assert_eq!(status, OrderStatus::Cancelled);
        assert!(engine.drain_trades().is_empty());

        // The resting order is untouched
        let resting = engine.order_book().get_order(OrderId::new(1)).unwrap();
        assert_eq!(resting.remaining(), Quantity::new(5));
        engine.order_book().check_invariants();
    }

    #[test]
    fn test_fok_sufficient_depth_fills_fully() {
        let mut engine = MatchingEngine::new();
        submit(&mut engine, 1, Side::Sell, OrderType::Limit, 100, 6);
        submit(&mut engine, 2, Side::Sell, OrderType::Limit, 101, 6);

        let status = submit(&mut engine, 3, Side::Buy, OrderType::Fok, 101, 10);
        assert_eq!(status, OrderStatus::Filled);

        let trades = engine.drain_trades();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].quantity, Quantity::new(6));
        assert_eq!(trades[1].quantity, Quantity::new(4));
        engine.order_book().check_invariants();
    }

    #[test]
    fn test_fok_depth_beyond_limit_does_not_count() {
        let mut engine = MatchingEngine::new();
        submit(&mut engine, 1, Side::Sell, OrderType::Limit, 100, 5);
        submit(&mut engine, 2, Side::Sell, OrderType::Limit, 102, 10);

        // Depth at or under 101 is only 5
        let status = submit(&mut engine, 3, Side::Buy, OrderType::Fok, 101, 10);
        assert_eq!(status, OrderStatus::Cancelled);
        assert!(engine.drain_trades().is_empty());
        engine.order_book().check_invariants();
    }

    #[test]
    fn test_cancel_through_engine() {
        let mut engine = MatchingEngine::new();
        submit(&mut engine, 1, Side::Buy, OrderType::Limit, 100, 10);

        assert!(engine.cancel_order(OrderId::new(1)));
        assert!(!engine.cancel_order(OrderId::new(1)));
        assert_eq!(engine.stats().orders_cancelled, 1);
    }

    #[test]
    fn test_bounded_pool_rejects_through_engine() {
        let mut engine = MatchingEngine::with_config(EngineConfig {
            pool: PoolConfig {
                slab_capacity: 2,
                max_slabs: Some(1),
            },
        });
        submit(&mut engine, 1, Side::Buy, OrderType::Limit, 100, 10);
        submit(&mut engine, 2, Side::Buy, OrderType::Limit, 99, 10);

        let status = submit(&mut engine, 3, Side::Buy, OrderType::Limit, 98, 10);
        assert_eq!(status, OrderStatus::Rejected);
        assert_eq!(engine.stats().orders_rejected, 1);
        assert_eq!(engine.order_book().order_count(), 2);
        engine.order_book().check_invariants();
    }

    #[test]
    fn test_duplicate_id_rejected_without_side_effects() {
        let mut engine = MatchingEngine::new();
        submit(&mut engine, 1, Side::Buy, OrderType::Limit, 100, 10);
        let depth_before = engine
            .order_book()
            .depth_at_price(Side::Buy, Price::new(100));

        let status = submit(&mut engine, 1, Side::Buy, OrderType::Limit, 100, 5);
        assert_eq!(status, OrderStatus::Rejected);
        assert_eq!(
            engine
                .order_book()
                .depth_at_price(Side::Buy, Price::new(100)),
            depth_before
        );
        assert_eq!(engine.stats().orders_rejected, 1);
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let mut engine = MatchingEngine::new();
        let status = submit(&mut engine, 1, Side::Buy, OrderType::Limit, 100, 0);
        assert_eq!(status, OrderStatus::Rejected);
        assert_eq!(engine.order_book().order_count(), 0);
    }

    #[test]
    fn test_callback_sees_trades_inline() {
        use std::sync::{Arc, Mutex};

        let seen: Arc<Mutex<Vec<(u64, u64, u64)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut engine = MatchingEngine::with_callback(Box::new(move |trade: &Trade| {
            sink.lock().unwrap().push((
                trade.buy_order_id.as_u64(),
                trade.sell_order_id.as_u64(),
                trade.quantity.raw(),
            ));
        }));

        submit(&mut engine, 1, Side::Sell, OrderType::Limit, 100, 5);
        submit(&mut engine, 2, Side::Sell, OrderType::Limit, 100, 5);
        submit(&mut engine, 3, Side::Buy, OrderType::Limit, 100, 8);

        assert_eq!(*seen.lock().unwrap(), vec![(3, 1, 5), (3, 2, 3)]);
        // Trades remain drainable after callback delivery
        assert_eq!(engine.drain_trades().len(), 2);
    }

    #[test]
    fn test_stats_counters() {
        let mut engine = MatchingEngine::new();
        submit(&mut engine, 1, Side::Sell, OrderType::Limit, 100, 5);
        submit(&mut engine, 2, Side::Buy, OrderType::Limit, 100, 5);
        submit(&mut engine, 3, Side::Buy, OrderType::Limit, 100, 0);

        let stats = engine.stats();
        assert_eq!(stats.orders_submitted, 3);
        assert_eq!(stats.orders_rejected, 1);
        assert_eq!(stats.trades_executed, 1);
    }

    #[test]
    fn test_clear_keeps_pending_trades() {
        let mut engine = MatchingEngine::new();
        submit(&mut engine, 1, Side::Sell, OrderType::Limit, 100, 5);
        submit(&mut engine, 2, Side::Buy, OrderType::Limit, 100, 3);
        submit(&mut engine, 3, Side::Buy, OrderType::Limit, 99, 1);

        engine.order_book_mut().clear();
        assert_eq!(engine.order_book().order_count(), 0);

        // Clearing the book does not touch recorded trades
        assert_eq!(engine.drain_trades().len(), 1);
    }
}
