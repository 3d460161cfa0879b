//! Opportunity scoring.
//!
//! Turns depth and trend metrics into a 0–100 score per candidate action,
//! then discounts pairs traded within the recency window so the bot does
//! not hammer the same market every iteration.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::analysis::{MarketDepthMetrics, PriceTrendMetrics};
use crate::config::RecencyConfig;
use crate::types::{Action, TradeHistoryRecord};

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

const BASE_SCORE: f64 = 50.0;
const MAX_SCORE: f64 = 100.0;

const IMBALANCE_THRESHOLD: f64 = 0.2;
const WIDE_SPREAD_PCT: f64 = 5.0;
const VOLUME_RATIO: f64 = 1.5;

const BUY_UPTREND_PCT: f64 = 5.0;
const BUY_DIP_PCT: f64 = -10.0;
const BUY_CALM_VOLATILITY: f64 = 10.0;

const SELL_DOWNTREND_PCT: f64 = -5.0;
const SELL_PEAK_PCT: f64 = 15.0;
const SELL_VOLATILE: f64 = 15.0;

const HIGH_MOMENTUM_PCT: f64 = 20.0;

// ---------------------------------------------------------------------------
// Component scores
// ---------------------------------------------------------------------------

/// Depth contribution, 0–35.
pub fn score_market_depth(depth: &MarketDepthMetrics, action: Action) -> f64 {
    let mut score = 0.0;
    let buy_volume = depth.buy_volume as f64;
    let sell_volume = depth.sell_volume as f64;

    match action {
        Action::Buy => {
            // Selling pressure pushes prices down
            if depth.order_imbalance < -IMBALANCE_THRESHOLD {
                score += 15.0;
            }
            if depth.spread_percentage > WIDE_SPREAD_PCT {
                score += 10.0;
            }
            // Plenty of supply to buy into
            if sell_volume > buy_volume * VOLUME_RATIO {
                score += 10.0;
            }
        }
        Action::Sell => {
            if depth.order_imbalance > IMBALANCE_THRESHOLD {
                score += 15.0;
            }
            if depth.spread_percentage > WIDE_SPREAD_PCT {
                score += 10.0;
            }
            if buy_volume > sell_volume * VOLUME_RATIO {
                score += 10.0;
            }
        }
    }

    score
}

/// Trend contribution, 0–25.
pub fn score_price_trends(trends: &PriceTrendMetrics, action: Action) -> f64 {
    let mut score = 0.0;

    match action {
        Action::Buy => {
            if trends.trend > BUY_UPTREND_PCT {
                score += 20.0;
            } else if trends.trend < BUY_DIP_PCT {
                // Buy the dip
                score += 15.0;
            }
            if trends.volatility < BUY_CALM_VOLATILITY {
                score += 5.0;
            }
        }
        Action::Sell => {
            if trends.trend < SELL_DOWNTREND_PCT {
                // Sell before a further drop
                score += 10.0;
            } else if trends.trend > SELL_PEAK_PCT {
                // Sell at the peak
                score += 20.0;
            }
            if trends.volatility > SELL_VOLATILE {
                score += 5.0;
            }
        }
    }

    score
}

/// Base 50 plus depth, trend and momentum bonuses, capped at 100.
///
/// Not floored here; only the recency penalty clamps at zero.
pub fn calculate_score(
    depth: &MarketDepthMetrics,
    trends: &PriceTrendMetrics,
    action: Action,
) -> f64 {
    let mut score = BASE_SCORE;
    score += score_market_depth(depth, action);
    score += score_price_trends(trends, action);

    if trends.momentum.abs() > HIGH_MOMENTUM_PCT {
        score += 10.0;
    }

    score.min(MAX_SCORE)
}

// ---------------------------------------------------------------------------
// Recency penalty
// ---------------------------------------------------------------------------

/// Linear cooldown: a pair traded just now loses `max_penalty` points,
/// decaying to nothing at `window_minutes`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecencyPenalty {
    window_minutes: f64,
    max_penalty: f64,
}

impl Default for RecencyPenalty {
    fn default() -> Self {
        Self::new(RecencyConfig::default())
    }
}

impl RecencyPenalty {
    pub fn new(config: RecencyConfig) -> Self {
        Self {
            window_minutes: config.window_minutes,
            max_penalty: config.max_penalty,
        }
    }

    /// Penalty for a trade `minutes_since` ago. Future timestamps count as now.
    pub fn penalty_after(&self, minutes_since: f64) -> f64 {
        let minutes = minutes_since.max(0.0);
        if minutes < self.window_minutes {
            self.max_penalty * (1.0 - minutes / self.window_minutes)
        } else {
            0.0
        }
    }

    /// Discount `base_score` by the most recent trade of `pair_name`.
    pub fn apply(
        &self,
        base_score: f64,
        pair_name: &str,
        history: &[TradeHistoryRecord],
        now: DateTime<Utc>,
    ) -> f64 {
        let Some(recent) = history.iter().rev().find(|t| t.pair_name == pair_name) else {
            return base_score;
        };

        let minutes_since = (now - recent.timestamp).num_milliseconds() as f64 / 60_000.0;
        let penalty = self.penalty_after(minutes_since);
        if penalty <= 0.0 {
            return base_score;
        }

        info!(
            pair = pair_name,
            penalty = format!("{penalty:.1}"),
            minutes_since = format!("{minutes_since:.1}"),
            "Applied recency penalty"
        );

        (base_score - penalty).max(0.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
