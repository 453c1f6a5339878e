//! Tick-based price and quantity types.
//!
//! Prices are signed integer ticks (e.g. cents) and quantities are unsigned
//! integers, so all arithmetic is exact and comparisons are total. No
//! floating point or decimal representation appears anywhere in the book.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Monotonic nanoseconds since an arbitrary epoch.
///
/// Used only for FIFO tiebreaking inside a price level and for stamping
/// trades; absolute values carry no meaning across engine instances.
pub type Timestamp = i64;

/// Price in ticks.
///
/// The type admits negative values; the book assumes non-negative prices
/// but does not enforce them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    pub const ZERO: Price = Price(0);

    /// Create a new Price from raw ticks
    pub fn new(ticks: i64) -> Self {
        Self(ticks)
    }

    /// Get the raw tick count
    pub fn ticks(&self) -> i64 {
        self.0
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl From<i64> for Price {
    fn from(ticks: i64) -> Self {
        Self(ticks)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Quantity in whole units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(u64);

impl Quantity {
    pub const ZERO: Quantity = Quantity(0);

    /// Create a new Quantity from a raw value
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw value
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Check if the quantity is zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// The smaller of two quantities
    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }
}

impl Add for Quantity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Quantity {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        assert!(
            self.0 >= rhs.0,
            "Quantity subtraction would result in negative"
        );
        Self(self.0 - rhs.0)
    }
}

impl From<u64> for Quantity {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_arithmetic() {
        let p1 = Price::new(100);
        let p2 = Price::new(50);

        assert_eq!(p1 + p2, Price::new(150));
        assert_eq!(p1 - p2, Price::new(50));
        // Spread of a crossed book is negative, which the type admits
        assert_eq!(p2 - p1, Price::new(-50));
    }

    #[test]
    fn test_price_ordering() {
        assert!(Price::new(-1) < Price::ZERO);
        assert!(Price::new(100) < Price::new(101));
    }

    #[test]
    fn test_quantity_arithmetic() {
        let q1 = Quantity::new(10);
        let q2 = Quantity::new(3);

        assert_eq!(q1 + q2, Quantity::new(13));
        assert_eq!(q1 - q2, Quantity::new(7));
        assert_eq!(q1.min(q2), q2);
    }

    #[test]
    #[should_panic(expected = "Quantity subtraction would result in negative")]
    fn test_quantity_underflow_panics() {
        let _ = Quantity::new(1) - Quantity::new(2);
    }

    #[test]
    fn test_quantity_zero() {
        assert!(Quantity::ZERO.is_zero());
        assert!(!Quantity::new(1).is_zero());
    }

    #[test]
    fn test_serialization() {
        let price = Price::new(-25);
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "-25");
        assert_eq!(serde_json::from_str::<Price>(&json).unwrap(), price);

        let qty = Quantity::new(8);
        let json = serde_json::to_string(&qty).unwrap();
        assert_eq!(json, "8");
        assert_eq!(serde_json::from_str::<Quantity>(&json).unwrap(), qty);
    }
}
