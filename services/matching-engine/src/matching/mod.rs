//! Matching primitives
//!
//! Price-crossing predicates and the trade recorder. The matching loop
//! itself lives in `engine`.

pub mod crossing;
pub mod recorder;

pub use recorder::{TradeCallback, TradeRecorder};
