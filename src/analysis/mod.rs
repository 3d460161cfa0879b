//! Market analyzer.
//!
//! Pure functions turning an order book and a price series into the depth
//! and trend metrics the scorer consumes. Nothing here performs I/O, and
//! every division is guarded so degenerate input yields zeros, never NaN.

use serde::Serialize;

use crate::types::{BookEntry, OrderBook, PricePoint};

/// Number of most-recent prices in the short moving average.
const SHORT_SMA_WINDOW: usize = 5;

// ---------------------------------------------------------------------------
// Market depth
// ---------------------------------------------------------------------------

/// Liquidity profile of one order book.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MarketDepthMetrics {
    pub buy_volume: i64,
    pub sell_volume: i64,
    pub buy_value: i64,
    pub sell_value: i64,
    /// (lowest ask − highest bid) / lowest ask × 100.
    pub spread_percentage: f64,
    /// (buy − sell) / (buy + sell), in [−1, 1].
    pub order_imbalance: f64,
}

/// Volume and value of the live levels on one side, saturating.
fn side_totals(orders: &[BookEntry]) -> (i64, i64) {
    orders.iter().filter(|o| o.is_live()).fold((0i64, 0i64), |(volume, value), o| {
        (
            volume.saturating_add(o.quantity),
            value.saturating_add(o.quantity.saturating_mul(o.price)),
        )
    })
}

/// Sum volumes and values per side, then derive spread and imbalance.
pub fn analyze_market_depth(book: &OrderBook) -> MarketDepthMetrics {
    let (buy_volume, buy_value) = side_totals(&book.buy_orders);
    let (sell_volume, sell_value) = side_totals(&book.sell_orders);

    let spread_percentage = match (book.highest_buy(), book.lowest_sell()) {
        (Some(bid), Some(ask)) if ask.price > 0 => {
            (ask.price as f64 - bid.price as f64) / ask.price as f64 * 100.0
        }
        _ => 0.0,
    };

    let total = buy_volume.saturating_add(sell_volume);
    let order_imbalance = if total > 0 {
        (buy_volume as f64 - sell_volume as f64) / total as f64
    } else {
        0.0
    };

    MarketDepthMetrics {
        buy_volume,
        sell_volume,
        buy_value,
        sell_value,
        spread_percentage,
        order_imbalance,
    }
}

// ---------------------------------------------------------------------------
// Price trends
// ---------------------------------------------------------------------------

/// Trend profile of a price series. `Default` is the all-zero sentinel
/// returned when there is too little data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PriceTrendMetrics {
    /// Short SMA vs long SMA, percent.
    pub trend: f64,
    /// Population std-dev of period returns, ×100.
    pub volatility: f64,
    /// Last vs first price, percent.
    pub momentum: f64,
    pub sma_short: f64,
    pub sma_long: f64,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Compute trend, volatility and momentum from a chart series.
///
/// Points with a missing or zero price are dropped first; fewer than two
/// remaining prices yields the zero sentinel.
pub fn analyze_price_trends(series: &[PricePoint]) -> PriceTrendMetrics {
    let prices: Vec<f64> = series
        .iter()
        .filter_map(|p| p.price)
        .filter(|p| *p != 0.0 && p.is_finite())
        .collect();

    if prices.len() < 2 {
        return PriceTrendMetrics::default();
    }

    let n = prices.len();
    let sma_short = mean(&prices[n - SHORT_SMA_WINDOW.min(n)..]);
    let sma_long = mean(&prices);

    let trend = if sma_long > 0.0 {
        (sma_short - sma_long) / sma_long * 100.0
    } else {
        0.0
    };

    let returns: Vec<f64> = prices
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect();
    let mean_return = mean(&returns);
    let variance = mean(
        &returns
            .iter()
            .map(|r| (r - mean_return).powi(2))
            .collect::<Vec<_>>(),
    );
    let volatility = variance.sqrt() * 100.0;

    let first = prices[0];
    let last = prices[n - 1];
    let momentum = if first > 0.0 {
        (last - first) / first * 100.0
    } else {
        0.0
    };

    PriceTrendMetrics {
        trend,
        volatility,
        momentum,
        sma_short,
        sma_long,
    }
}

// ---------------------------------------------------------------------------
// Order book summary
// ---------------------------------------------------------------------------

/// Human-oriented snapshot of the top of book, used for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OrderBookSummary {
    pub buy_orders_count: usize,
    pub sell_orders_count: usize,
    pub highest_buy: Option<BookEntry>,
    pub lowest_sell: Option<BookEntry>,
    /// Absolute gap between best ask and best bid.
    pub spread: Option<i64>,
}

pub fn summarize_order_book(book: &OrderBook) -> OrderBookSummary {
    let highest_buy = book.highest_buy().copied();
    let lowest_sell = book.lowest_sell().copied();
    let spread = match (highest_buy, lowest_sell) {
        (Some(bid), Some(ask)) => Some(ask.price.saturating_sub(bid.price)),
        _ => None,
    };

    OrderBookSummary {
        buy_orders_count: book.buy_orders.len(),
        sell_orders_count: book.sell_orders.len(),
        highest_buy,
        lowest_sell,
        spread,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
