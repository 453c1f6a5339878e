//! Error types for book operations.
//!
//! Every error is recovered locally and surfaced as a return value; nothing
//! here ever crosses the engine boundary as a panic. Broken internal
//! invariants are programmer errors and are not represented.

use crate::ids::OrderId;
use crate::numeric::Quantity;
use thiserror::Error;

/// Why a book operation was refused.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookError {
    #[error("quantity must be positive")]
    ZeroQuantity,

    #[error("order id already live: {id}")]
    DuplicateId { id: OrderId },

    #[error("order not found: {id}")]
    NotFound { id: OrderId },

    #[error("order already fully filled: {id}")]
    AlreadyFilled { id: OrderId },

    #[error("new quantity {requested} is below filled quantity {filled}")]
    ShrinkBelowFilled {
        requested: Quantity,
        filled: Quantity,
    },

    #[error("order storage exhausted")]
    StorageExhausted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BookError::NotFound {
            id: OrderId::new(17),
        };
        assert_eq!(err.to_string(), "order not found: 17");

        let err = BookError::ShrinkBelowFilled {
            requested: Quantity::new(3),
            filled: Quantity::new(5),
        };
        assert!(err.to_string().contains("below filled"));
    }
}
