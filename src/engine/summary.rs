//! Session bookkeeping.
//!
//! Reconciles each iteration into running totals and produces the summary
//! logged at shutdown.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::engine::executor::ExecutedTrade;

// ---------------------------------------------------------------------------
// Iteration report
// ---------------------------------------------------------------------------

/// Outcome of one driver iteration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterationReport {
    pub iteration: u64,
    pub trades: usize,
    /// Σ price × quantity over the iteration's trades.
    pub total_value: i64,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Session summary
// ---------------------------------------------------------------------------

/// Running totals across a bot session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSummary {
    pub iterations: u64,
    pub total_trades: u64,
    pub total_value: i64,
    score_sum: f64,
    expected_profit_sum: f64,
}

impl SessionSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one iteration's executed trades into the totals.
    pub fn reconcile(&mut self, trades: &[ExecutedTrade]) -> IterationReport {
        self.iterations += 1;

        let mut value = 0i64;
        for trade in trades {
            value = value.saturating_add(trade.total_value());
            self.score_sum += trade.opportunity.score;
            self.expected_profit_sum += trade.opportunity.expected_profit;
        }
        self.total_trades += trades.len() as u64;
        self.total_value = self.total_value.saturating_add(value);

        let report = IterationReport {
            iteration: self.iterations,
            trades: trades.len(),
            total_value: value,
            timestamp: Utc::now(),
        };

        info!(
            iteration = report.iteration,
            trades = report.trades,
            value = report.total_value,
            session_trades = self.total_trades,
            "Iteration reconciled"
        );

        report
    }

    /// Mean opportunity score of executed trades (0 when none).
    pub fn average_score(&self) -> f64 {
        if self.total_trades == 0 {
            0.0
        } else {
            self.score_sum / self.total_trades as f64
        }
    }

    /// Mean expected profit (percent) of executed trades (0 when none).
    pub fn average_expected_profit(&self) -> f64 {
        if self.total_trades == 0 {
            0.0
        } else {
            self.expected_profit_sum / self.total_trades as f64
        }
    }

    pub fn log(&self, bot: &str) {
        info!(
            bot,
            iterations = self.iterations,
            trades = self.total_trades,
            total_value = self.total_value,
            avg_score = format!("{:.1}", self.average_score()),
            avg_expected_profit = format!("{:.2}%", self.average_expected_profit()),
            "Session summary"
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Action, OrderReceipt, StrategyLabel, TradeOpportunity};

    fn make_trade(price: i64, quantity: i64, score: f64, expected_profit: f64) -> ExecutedTrade {
        ExecutedTrade {
            opportunity: TradeOpportunity {
                asset_pair_id: 1,
                pair_name: "TUNA/TNB".to_string(),
                action: Action::Buy,
                price,
                quantity,
                score,
                strategy: StrategyLabel::TrendFollowing,
                reason: String::new(),
                currency_to_trade: "TUNA".to_string(),
                expected_profit,
            },
            receipt: OrderReceipt {
                order_id: "1".to_string(),
                asset_pair_id: 1,
                price,
                quantity,
                side: 1,
                timestamp: Utc::now(),
            },
            executed_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_session() {
        let summary = SessionSummary::new();
        assert_eq!(summary.iterations, 0);
        assert_eq!(summary.average_score(), 0.0);
        assert_eq!(summary.average_expected_profit(), 0.0);
    }

    #[test]
    fn test_reconcile_counts_iterations_without_trades() {
        let mut summary = SessionSummary::new();
        let report = summary.reconcile(&[]);
        summary.reconcile(&[]);
        assert_eq!(report.iteration, 1);
        assert_eq!(report.trades, 0);
        assert_eq!(summary.iterations, 2);
        assert_eq!(summary.total_trades, 0);
    }

    #[test]
    fn test_reconcile_accumulates_value_and_averages() {
        let mut summary = SessionSummary::new();
        let report = summary.reconcile(&[make_trade(98, 3, 80.0, 2.0)]);
        assert_eq!(report.total_value, 294);

        summary.reconcile(&[make_trade(10, 5, 60.0, 1.0)]);
        assert_eq!(summary.total_trades, 2);
        assert_eq!(summary.total_value, 344);
        assert_eq!(summary.average_score(), 70.0);
        assert_eq!(summary.average_expected_profit(), 1.5);
    }
}
