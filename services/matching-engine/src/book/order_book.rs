//! Order book: two ordered price-level maps over pooled order storage.
//!
//! Bids iterate descending and asks ascending, so the best quote on either
//! side is one map probe away. A side map never holds an empty level; the
//! level is erased the moment its FIFO drains. `by_id` gives O(1)
//! cancellation by handle lookup.
//!
//! `add_order` is the insertion primitive only. It never matches; the
//! engine inserts and then walks the opposing side itself.

use std::collections::{BTreeMap, HashMap};

use lob_types::{BookError, OrderId, OrderStatus, OrderType, Price, Quantity, Side, Timestamp};

use crate::book::order::Order;
use crate::book::price_level::PriceLevel;
use crate::clock::{Clock, MonotonicClock};
use crate::pool::{PoolConfig, PoolStats, SlabPool, SlotIndex};

/// Single-instrument limit order book.
pub struct OrderBook {
    /// Bid levels, best (highest) price last in map order
    bids: BTreeMap<Price, PriceLevel>,
    /// Ask levels, best (lowest) price first in map order
    asks: BTreeMap<Price, PriceLevel>,
    /// Live order handles by id
    by_id: HashMap<OrderId, SlotIndex>,
    /// Owns every order record
    pool: SlabPool<Order>,
    clock: Box<dyn Clock>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    pub fn with_config(config: PoolConfig) -> Self {
        Self::with_clock(config, Box::new(MonotonicClock::new()))
    }

    /// Build a book over an injected time source, for deterministic replay
    /// and tests.
    pub fn with_clock(config: PoolConfig, clock: Box<dyn Clock>) -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            by_id: HashMap::new(),
            pool: SlabPool::new(config),
            clock,
        }
    }

    /// Insert a new resting order at the tail of its price level.
    ///
    /// Creates the level if this is the first order at that price. On any
    /// error the book is untouched.
    pub fn add_order(
        &mut self,
        id: OrderId,
        side: Side,
        order_type: OrderType,
        price: Price,
        quantity: Quantity,
    ) -> Result<(), BookError> {
        if quantity.is_zero() {
            return Err(BookError::ZeroQuantity);
        }
        if self.by_id.contains_key(&id) {
            return Err(BookError::DuplicateId { id });
        }

        let idx = self
            .pool
            .acquire()
            .map_err(|_| BookError::StorageExhausted)?;
        let timestamp = self.clock.now();
        {
            let order = self.pool.get_mut(idx).expect("acquired slot is live");
            order.id = id;
            order.side = side;
            order.order_type = order_type;
            order.price = price;
            order.quantity = quantity;
            order.filled_quantity = Quantity::ZERO;
            order.timestamp = timestamp;
            order.status = OrderStatus::New;
            order.prev = None;
            order.next = None;
        }

        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        let level = levels.entry(price).or_insert_with(|| PriceLevel::new(price));
        level.push_back(idx, &mut self.pool);

        self.by_id.insert(id, idx);
        Ok(())
    }

    /// Remove a live order and release its record.
    pub fn cancel_order(&mut self, id: OrderId) -> Result<(), BookError> {
        let idx = *self.by_id.get(&id).ok_or(BookError::NotFound { id })?;
        if self.pool.get(idx).expect("indexed order is live").is_filled() {
            return Err(BookError::AlreadyFilled { id });
        }

        self.unlink_from_level(idx);
        self.by_id.remove(&id);
        self.pool.release(idx);
        Ok(())
    }

    /// Change a live order's price and total quantity.
    ///
    /// Same price with a non-shrinking quantity is applied in place and
    /// keeps time priority. Anything else removes the order and re-inserts
    /// the unfilled residual at the tail of the new level with a fresh
    /// timestamp, forfeiting priority. A residual of zero removes the
    /// order outright.
    pub fn modify_order(
        &mut self,
        id: OrderId,
        new_price: Price,
        new_quantity: Quantity,
    ) -> Result<(), BookError> {
        if new_quantity.is_zero() {
            return Err(BookError::ZeroQuantity);
        }
        let idx = *self.by_id.get(&id).ok_or(BookError::NotFound { id })?;

        let (side, order_type, price, quantity, filled) = {
            let order = self.pool.get(idx).expect("indexed order is live");
            (
                order.side,
                order.order_type,
                order.price,
                order.quantity,
                order.filled_quantity,
            )
        };
        if filled >= quantity {
            return Err(BookError::AlreadyFilled { id });
        }
        if new_quantity < filled {
            return Err(BookError::ShrinkBelowFilled {
                requested: new_quantity,
                filled,
            });
        }

        if new_price == price && new_quantity >= quantity {
            let order = self.pool.get_mut(idx).expect("indexed order is live");
            let old_remaining = order.remaining();
            order.quantity = new_quantity;
            self.update_level_total(idx, old_remaining);
            return Ok(());
        }

        self.unlink_from_level(idx);
        self.by_id.remove(&id);
        self.pool.release(idx);

        let residual = new_quantity - filled;
        if !residual.is_zero() {
            self.add_order(id, side, order_type, new_price, residual)?;
            if !filled.is_zero() {
                // Restore fill history. Remaining is unchanged, so the
                // level total needs no adjustment.
                let idx = *self.by_id.get(&id).expect("re-inserted order is live");
                let order = self.pool.get_mut(idx).expect("re-inserted order is live");
                order.quantity = new_quantity;
                order.filled_quantity = filled;
                order.status = OrderStatus::PartiallyFilled;
            }
        }
        Ok(())
    }

    /// Highest bid price, if any side depth exists
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.keys().next_back().copied()
    }

    /// Lowest ask price, if any side depth exists
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.keys().next().copied()
    }

    /// `best_ask - best_bid`, when both sides are populated
    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Midpoint of the best quotes, rounded toward the bid
    pub fn mid_price(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(Price::new((bid.ticks() + ask.ticks()) / 2)),
            _ => None,
        }
    }

    /// Total resting quantity at an exact price, zero if no level
    pub fn depth_at_price(&self, side: Side, price: Price) -> Quantity {
        let levels = match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        };
        levels
            .get(&price)
            .map(PriceLevel::total_quantity)
            .unwrap_or(Quantity::ZERO)
    }

    /// Top `n` levels in side-native order: bids descending, asks
    /// ascending. Shorter than `n` when the side has fewer levels.
    pub fn get_levels(&self, side: Side, n: usize) -> Vec<(Price, Quantity)> {
        match side {
            Side::Buy => self
                .bids
                .iter()
                .rev()
                .take(n)
                .map(|(price, level)| (*price, level.total_quantity()))
                .collect(),
            Side::Sell => self
                .asks
                .iter()
                .take(n)
                .map(|(price, level)| (*price, level.total_quantity()))
                .collect(),
        }
    }

    /// Read-only view of a live order
    pub fn get_order(&self, id: OrderId) -> Option<&Order> {
        let idx = *self.by_id.get(&id)?;
        self.pool.get(idx)
    }

    /// Number of live orders
    pub fn order_count(&self) -> usize {
        self.by_id.len()
    }

    /// Number of populated price levels on one side
    pub fn level_count(&self, side: Side) -> usize {
        match side {
            Side::Buy => self.bids.len(),
            Side::Sell => self.asks.len(),
        }
    }

    /// Occupancy of the backing pool
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Release every order and drop both side maps.
    pub fn clear(&mut self) {
        for (_, idx) in self.by_id.drain() {
            self.pool.release(idx);
        }
        self.bids.clear();
        self.asks.clear();
    }

    /// Walk the whole book and panic on any structural inconsistency.
    ///
    /// Intended for tests and debugging; cost is linear in live orders.
    pub fn check_invariants(&self) {
        let mut seen = 0usize;
        for (side, levels) in [(Side::Buy, &self.bids), (Side::Sell, &self.asks)] {
            for (price, level) in levels {
                assert!(!level.is_empty(), "empty level at {price} left in map");
                assert_eq!(level.price(), *price, "level keyed under wrong price");

                let mut total = Quantity::ZERO;
                let mut count = 0usize;
                let mut cursor = level.first();
                while let Some(idx) = cursor {
                    let order = self.pool.get(idx).expect("linked order is live");
                    assert_eq!(order.side, side, "order linked on wrong side");
                    assert_eq!(order.price, *price, "order linked at wrong price");
                    assert!(!order.is_filled(), "filled order left resting");
                    assert_eq!(
                        self.by_id.get(&order.id),
                        Some(&idx),
                        "linked order missing from id index"
                    );
                    total = total + order.remaining();
                    count += 1;
                    cursor = order.next;
                }
                assert_eq!(
                    level.total_quantity(),
                    total,
                    "level total out of sync at {price}"
                );
                assert_eq!(level.order_count(), count);
                seen += count;
            }
        }
        assert_eq!(seen, self.by_id.len(), "id index holds unlinked orders");
    }

    // ── Engine-facing primitives ────────────────────────────────────────

    pub(crate) fn index_of(&self, id: OrderId) -> Option<SlotIndex> {
        self.by_id.get(&id).copied()
    }

    pub(crate) fn order_ref(&self, idx: SlotIndex) -> &Order {
        self.pool.get(idx).expect("live order handle")
    }

    pub(crate) fn order_mut(&mut self, idx: SlotIndex) -> &mut Order {
        self.pool.get_mut(idx).expect("live order handle")
    }

    /// Head of the FIFO at an exact price, the time-priority winner
    pub(crate) fn first_order_at_price(&self, side: Side, price: Price) -> Option<SlotIndex> {
        let levels = match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        };
        levels.get(&price).and_then(PriceLevel::first)
    }

    /// Remove a completely filled order. The level is erased if it drains.
    pub(crate) fn remove_filled_order(&mut self, idx: SlotIndex) {
        let order = self.pool.get(idx).expect("live order handle");
        debug_assert!(order.is_filled(), "removing an unfilled order");
        let id = order.id;

        self.unlink_from_level(idx);
        self.by_id.remove(&id);
        self.pool.release(idx);
    }

    /// Fold a linked order's quantity change into its level total.
    pub(crate) fn update_level_total(&mut self, idx: SlotIndex, old_remaining: Quantity) {
        let (side, price) = {
            let order = self.pool.get(idx).expect("live order handle");
            (order.side, order.price)
        };
        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        levels
            .get_mut(&price)
            .expect("linked order has a level")
            .update_total(idx, old_remaining, &self.pool);
    }

    /// Opposing depth reachable by a taker at `limit`, capped at `needed`.
    ///
    /// Walks levels in priority order and stops as soon as the cap is
    /// covered, so the cost is bounded by the crossable prefix.
    pub(crate) fn crossable_depth(
        &self,
        taker_side: Side,
        limit: Price,
        needed: Quantity,
    ) -> Quantity {
        let mut depth = Quantity::ZERO;
        match taker_side {
            Side::Buy => {
                for (price, level) in &self.asks {
                    if *price > limit || depth >= needed {
                        break;
                    }
                    depth = depth + level.total_quantity();
                }
            }
            Side::Sell => {
                for (price, level) in self.bids.iter().rev() {
                    if *price < limit || depth >= needed {
                        break;
                    }
                    depth = depth + level.total_quantity();
                }
            }
        }
        depth
    }

    pub(crate) fn now(&mut self) -> Timestamp {
        self.clock.now()
    }

    fn unlink_from_level(&mut self, idx: SlotIndex) {
        let (side, price) = {
            let order = self.pool.get(idx).expect("live order handle");
            (order.side, order.price)
        };
        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        if let Some(level) = levels.get_mut(&price) {
            level.unlink(idx, &mut self.pool);
            if level.is_empty() {
                levels.remove(&price);
            }
        }
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}
