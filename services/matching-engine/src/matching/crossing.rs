//! Crossing detection logic
//!
//! Determines when a taker can trade against a resting price.

use lob_types::{OrderType, Price, Side};

/// Price bound a taker honours while matching.
///
/// Market orders accept any opposing price; everything else stops at its
/// limit.
pub fn price_limit(order_type: OrderType, price: Price) -> Option<Price> {
    match order_type {
        OrderType::Market => None,
        OrderType::Limit | OrderType::Ioc | OrderType::Fok => Some(price),
    }
}

/// Check if a taker bounded by `limit` crosses a resting price.
///
/// A buy crosses while its limit is at or above the resting ask; a sell
/// crosses while its limit is at or below the resting bid. `None` means
/// unbounded.
pub fn crosses(taker_side: Side, limit: Option<Price>, resting_price: Price) -> bool {
    match limit {
        None => true,
        Some(limit) => match taker_side {
            Side::Buy => limit >= resting_price,
            Side::Sell => limit <= resting_price,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buy_crosses_at_or_above_ask() {
        assert!(crosses(Side::Buy, Some(Price::new(100)), Price::new(99)));
        assert!(crosses(Side::Buy, Some(Price::new(100)), Price::new(100)));
        assert!(!crosses(Side::Buy, Some(Price::new(100)), Price::new(101)));
    }

    #[test]
    fn test_sell_crosses_at_or_below_bid() {
        assert!(crosses(Side::Sell, Some(Price::new(100)), Price::new(101)));
        assert!(crosses(Side::Sell, Some(Price::new(100)), Price::new(100)));
        assert!(!crosses(Side::Sell, Some(Price::new(100)), Price::new(99)));
    }

    #[test]
    fn test_unbounded_always_crosses() {
        assert!(crosses(Side::Buy, None, Price::new(1_000_000)));
        assert!(crosses(Side::Sell, None, Price::new(-1)));
    }

    #[test]
    fn test_price_limit_by_type() {
        let p = Price::new(50);
        assert_eq!(price_limit(OrderType::Limit, p), Some(p));
        assert_eq!(price_limit(OrderType::Ioc, p), Some(p));
        assert_eq!(price_limit(OrderType::Fok, p), Some(p));
        assert_eq!(price_limit(OrderType::Market, p), None);
    }
}
