//! Order lifecycle enums.

use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    Buy,
    /// Sell order (ask)
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Execution policy for a submitted order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    /// Match what crosses, rest the remainder at the limit price
    Limit,
    /// Match at any opposing price, discard the remainder
    Market,
    /// Immediate-or-cancel: match what crosses now, discard the remainder
    Ioc,
    /// Fill-or-kill: execute the full quantity now or nothing at all
    Fok,
}

/// Observable end state of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Resting in the book, nothing filled
    New,
    /// Some quantity filled; the rest is resting or was discarded
    PartiallyFilled,
    /// Completely filled (terminal)
    Filled,
    /// Removed with nothing filled (terminal)
    Cancelled,
    /// Failed validation, no state change (terminal)
    Rejected,
}

impl OrderStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }
}
