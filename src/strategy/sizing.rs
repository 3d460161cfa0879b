//! Order sizing.
//!
//! Two deliberately separate formulas: the scoring bot sizes against the
//! best price with a 30%/500 spend cap, the randomized bot uses a tighter
//! 10%/100 cap, fallback prices for empty books and a random liquidation
//! fraction. All results are truncated toward zero; a non-positive price or
//! quantity means "no order".

use crate::config::{HawkeyeConfig, RandyConfig};
use crate::types::OrderBook;

/// Concrete order parameters, both strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizedOrder {
    pub price: i64,
    pub quantity: i64,
}

impl SizedOrder {
    /// `None` unless both fields are positive.
    pub fn checked(price: i64, quantity: i64) -> Option<Self> {
        (price > 0 && quantity > 0).then_some(Self { price, quantity })
    }
}

fn scale(value: i64, factor: f64) -> i64 {
    (value as f64 * factor).trunc() as i64
}

// ---------------------------------------------------------------------------
// Scoring bot
// ---------------------------------------------------------------------------

/// Buy just under the lowest ask, spending at most the configured share of
/// the base balance.
pub fn hawkeye_buy(lowest_sell: i64, base_balance: i64, config: &HawkeyeConfig) -> Option<SizedOrder> {
    let price = scale(lowest_sell, config.buy_discount);
    if price <= 0 {
        return None;
    }
    let spend = scale(base_balance, config.max_spend_fraction).min(config.max_spend_cap);
    SizedOrder::checked(price, spend / price)
}

/// Sell just above the highest bid, liquidating at most half the holding.
pub fn hawkeye_sell(highest_buy: i64, held: i64, config: &HawkeyeConfig) -> Option<SizedOrder> {
    let price = scale(highest_buy, config.sell_markup);
    let quantity = scale(held, config.sell_fraction).min(config.max_sell_quantity);
    SizedOrder::checked(price, quantity)
}

// ---------------------------------------------------------------------------
// Randomized bot
// ---------------------------------------------------------------------------

/// Buy below the lowest ask, or at the fallback price when there are no asks.
pub fn randy_buy(book: &OrderBook, base_balance: i64, config: &RandyConfig) -> Option<SizedOrder> {
    match book.lowest_sell() {
        None => SizedOrder::checked(config.fallback_buy_price, config.fallback_buy_quantity),
        Some(ask) => {
            let price = scale(ask.price, config.buy_discount);
            if price <= 0 {
                return None;
            }
            let spend = scale(base_balance, config.max_spend_fraction).min(config.max_spend_per_trade);
            SizedOrder::checked(price, spend / price)
        }
    }
}

/// Sell above the highest bid. `fraction` is the share of the holding to
/// liquidate, drawn by the caller.
pub fn randy_sell(book: &OrderBook, held: i64, fraction: f64, config: &RandyConfig) -> Option<SizedOrder> {
    match book.highest_buy() {
        None => SizedOrder::checked(
            config.fallback_sell_price,
            held.min(config.fallback_sell_quantity),
        ),
        Some(bid) => SizedOrder::checked(scale(bid.price, config.sell_markup), scale(held, fraction)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BookEntry;

    fn book(buys: &[(i64, i64)], sells: &[(i64, i64)]) -> OrderBook {
        OrderBook::new(
            buys.iter().map(|&(p, q)| BookEntry::new(p, q)).collect(),
            sells.iter().map(|&(p, q)| BookEntry::new(p, q)).collect(),
        )
    }

    #[test]
    fn test_checked_rejects_non_positive() {
        assert!(SizedOrder::checked(0, 5).is_none());
        assert!(SizedOrder::checked(5, 0).is_none());
        assert!(SizedOrder::checked(-1, 5).is_none());
        assert_eq!(SizedOrder::checked(5, 2), Some(SizedOrder { price: 5, quantity: 2 }));
    }

    // -- Scoring bot --

    #[test]
    fn test_hawkeye_buy_reference_case() {
        let order = hawkeye_buy(100, 1000, &HawkeyeConfig::default()).unwrap();
        assert_eq!(order, SizedOrder { price: 98, quantity: 3 });
    }

    #[test]
    fn test_hawkeye_buy_spend_cap_applies() {
        // 30% of 10_000 = 3000, capped at 500 → 500 / 49 = 10.
        let order = hawkeye_buy(50, 10_000, &HawkeyeConfig::default()).unwrap();
        assert_eq!(order, SizedOrder { price: 49, quantity: 10 });
    }

    #[test]
    fn test_hawkeye_buy_too_expensive_is_discarded() {
        assert!(hawkeye_buy(1000, 1000, &HawkeyeConfig::default()).is_none());
    }

    #[test]
    fn test_hawkeye_buy_price_floors_to_zero() {
        assert!(hawkeye_buy(1, 1000, &HawkeyeConfig::default()).is_none());
    }

    #[test]
    fn test_hawkeye_sell_half_capped() {
        let cfg = HawkeyeConfig::default();
        assert_eq!(hawkeye_sell(50, 40, &cfg), Some(SizedOrder { price: 51, quantity: 20 }));
        assert_eq!(hawkeye_sell(50, 1000, &cfg), Some(SizedOrder { price: 51, quantity: 100 }));
        assert!(hawkeye_sell(50, 1, &cfg).is_none());
    }

    // -- Randomized bot --

    #[test]
    fn test_randy_buy_fallback_without_asks() {
        let order = randy_buy(&book(&[(3, 1)], &[]), 500, &RandyConfig::default()).unwrap();
        assert_eq!(order, SizedOrder { price: 4, quantity: 20 });
    }

    #[test]
    fn test_randy_buy_below_lowest_ask() {
        // floor(20 × 0.95) = 19; min(floor(500 × 0.1), 100) = 50 → 50 / 19 = 2.
        let order = randy_buy(&book(&[], &[(25, 1), (20, 1)]), 500, &RandyConfig::default()).unwrap();
        assert_eq!(order, SizedOrder { price: 19, quantity: 2 });
    }

    #[test]
    fn test_randy_buy_per_trade_cap() {
        // 10% of 5000 = 500, capped at 100 → 100 / 9 = 11.
        let order = randy_buy(&book(&[], &[(10, 1)]), 5000, &RandyConfig::default()).unwrap();
        assert_eq!(order, SizedOrder { price: 9, quantity: 11 });
    }

    #[test]
    fn test_randy_sell_fallback_without_bids() {
        let cfg = RandyConfig::default();
        assert_eq!(randy_sell(&book(&[], &[]), 30, 0.5, &cfg), Some(SizedOrder { price: 10, quantity: 30 }));
        assert_eq!(randy_sell(&book(&[], &[]), 80, 0.5, &cfg), Some(SizedOrder { price: 10, quantity: 50 }));
    }

    #[test]
    fn test_randy_sell_above_highest_bid() {
        let order = randy_sell(&book(&[(20, 1), (40, 2)], &[]), 100, 0.5, &RandyConfig::default()).unwrap();
        assert_eq!(order, SizedOrder { price: 42, quantity: 50 });
    }

    #[test]
    fn test_randy_sell_tiny_fraction_discarded() {
        assert!(randy_sell(&book(&[(20, 1)], &[]), 1, 0.3, &RandyConfig::default()).is_none());
    }
}
