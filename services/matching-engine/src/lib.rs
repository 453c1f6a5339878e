//! Limit order book and matching engine for a single instrument.
//!
//! Incoming orders are matched against the opposing side of the book under
//! strict price-time priority; residual quantity rests, is discarded, or is
//! refunded depending on the order type (Limit, Market, IOC, FOK).
//!
//! **Key invariants:**
//! - Price-time priority strictly enforced: better prices match first, ties
//!   broken by insertion order within a price level
//! - Trade price is always the resting order's posted price
//! - Deterministic matching (same inputs → same outputs)
//! - Every rejection leaves the book exactly as it was
//!
//! The engine is single-threaded and synchronous. One instance serves one
//! instrument; independent instances may run on independent threads.

pub mod book;
pub mod clock;
pub mod engine;
pub mod matching;
pub mod pool;

pub use book::{Order, OrderBook, PriceLevel};
pub use engine::{EngineConfig, EngineStats, MatchingEngine};
pub use matching::{TradeCallback, TradeRecorder};
