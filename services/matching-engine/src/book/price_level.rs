//! Price level: an intrusive FIFO of orders at one price.
//!
//! The queue is threaded through the pooled orders' `prev`/`next` links,
//! so push, unlink, and total maintenance are all O(1). Time priority is
//! insertion order: the head is the oldest order and matches first.

use crate::book::order::Order;
use crate::pool::{SlabPool, SlotIndex};
use lob_types::{Price, Quantity};

/// All resting orders at a single price on one side, oldest first.
#[derive(Debug)]
pub struct PriceLevel {
    price: Price,
    total_quantity: Quantity,
    head: Option<SlotIndex>,
    tail: Option<SlotIndex>,
    len: usize,
}

impl PriceLevel {
    pub fn new(price: Price) -> Self {
        Self {
            price,
            total_quantity: Quantity::ZERO,
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn price(&self) -> Price {
        self.price
    }

    /// Sum of `remaining()` across every linked order.
    ///
    /// Maintained incrementally; any mutation of a linked order's
    /// quantities must be followed by `update_total` with the pre-mutation
    /// remaining, or this drifts.
    pub fn total_quantity(&self) -> Quantity {
        self.total_quantity
    }

    /// Number of resting orders at this level
    pub fn order_count(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Head of the FIFO, the time-priority winner
    pub(crate) fn first(&self) -> Option<SlotIndex> {
        self.head
    }

    /// Append an order at the tail.
    pub(crate) fn push_back(&mut self, idx: SlotIndex, pool: &mut SlabPool<Order>) {
        let old_tail = self.tail;
        let remaining = {
            let order = pool.get_mut(idx).expect("pushed order must be live");
            order.prev = old_tail;
            order.next = None;
            order.remaining()
        };

        match old_tail {
            Some(tail) => {
                pool.get_mut(tail).expect("tail order must be live").next = Some(idx);
            }
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
        self.total_quantity = self.total_quantity + remaining;
        self.len += 1;
    }

    /// Unlink an order from anywhere in the FIFO.
    pub(crate) fn unlink(&mut self, idx: SlotIndex, pool: &mut SlabPool<Order>) {
        let (prev, next, remaining) = {
            let order = pool.get(idx).expect("unlinked order must be live");
            (order.prev, order.next, order.remaining())
        };

        match prev {
            Some(prev) => pool.get_mut(prev).expect("prev order must be live").next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => pool.get_mut(next).expect("next order must be live").prev = prev,
            None => self.tail = prev,
        }

        let order = pool.get_mut(idx).expect("unlinked order must be live");
        order.prev = None;
        order.next = None;

        self.total_quantity = self.total_quantity - remaining;
        self.len -= 1;
    }

    /// Re-derive the total after a linked order's quantities changed.
    ///
    /// `old_remaining` is the order's `remaining()` before the mutation.
    pub(crate) fn update_total(
        &mut self,
        idx: SlotIndex,
        old_remaining: Quantity,
        pool: &SlabPool<Order>,
    ) {
        let new_remaining = pool.get(idx).expect("updated order must be live").remaining();
        self.total_quantity = self.total_quantity - old_remaining + new_remaining;
    }
}
