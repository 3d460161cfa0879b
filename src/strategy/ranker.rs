//! Opportunity ranker for the scoring bot.
//!
//! Walks every tradable pair, scores a candidate buy and sell per pair,
//! sizes them, applies the recency penalty and sorts best-first.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::analysis::{analyze_market_depth, analyze_price_trends, MarketDepthMetrics, PriceTrendMetrics};
use crate::config::{HawkeyeConfig, RecencyConfig};
use crate::exchange::ExchangeApi;
use crate::strategy::scoring::{calculate_score, RecencyPenalty};
use crate::strategy::sizing::{hawkeye_buy, hawkeye_sell};
use crate::strategy::OpportunitySelector;
use crate::types::{
    Action, AssetPair, BotError, OrderBook, StrategyLabel, TradeHistoryRecord, TradeOpportunity,
    WalletBalances,
};

pub struct OpportunityRanker {
    config: HawkeyeConfig,
    base_currency: String,
    penalty: RecencyPenalty,
}

impl OpportunityRanker {
    pub fn new(config: HawkeyeConfig, base_currency: &str, recency: RecencyConfig) -> Self {
        Self {
            config,
            base_currency: base_currency.to_string(),
            penalty: RecencyPenalty::new(recency),
        }
    }

    /// Evaluate every pair and return all surviving opportunities, penalized
    /// and sorted by score descending. Equal scores keep evaluation order.
    ///
    /// Only a failure to list pairs is returned as an error; a failing pair
    /// is logged and skipped.
    pub async fn rank(
        &self,
        api: &dyn ExchangeApi,
        wallets: &WalletBalances,
        history: &[TradeHistoryRecord],
        now: DateTime<Utc>,
    ) -> Result<Vec<TradeOpportunity>, BotError> {
        let pairs = api.list_asset_pairs().await?;
        debug!(pairs = pairs.len(), "Evaluating asset pairs");

        let mut opportunities = Vec::new();
        for pair in &pairs {
            match self.evaluate_pair(api, pair, wallets).await {
                Ok(found) => opportunities.extend(found),
                Err(e) => {
                    warn!(pair = %pair, error = %e, "Pair evaluation failed, skipping");
                }
            }
        }

        for opp in &mut opportunities {
            opp.score = self.penalty.apply(opp.score, &opp.pair_name, history, now);
        }

        // Vec::sort_by is stable
        opportunities.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        info!(
            pairs = pairs.len(),
            opportunities = opportunities.len(),
            "Ranking complete"
        );

        Ok(opportunities)
    }

    /// Candidate buy and sell for one pair, in that order.
    pub async fn evaluate_pair(
        &self,
        api: &dyn ExchangeApi,
        pair: &AssetPair,
        wallets: &WalletBalances,
    ) -> Result<Vec<TradeOpportunity>, BotError> {
        let book = api.get_order_book(pair.id).await?;
        let depth = analyze_market_depth(&book);

        let trends = match api.get_price_history(pair.id, &self.config.chart_range).await {
            Ok(series) => analyze_price_trends(&series),
            Err(e) => {
                warn!(pair = %pair, error = %e, "Price history unavailable, trend scoring skipped");
                PriceTrendMetrics::default()
            }
        };

        let mut found = Vec::with_capacity(2);
        if let Some(buy) = self.buy_opportunity(pair, &book, &depth, &trends, wallets) {
            found.push(buy);
        }
        if let Some(sell) = self.sell_opportunity(pair, &book, &depth, &trends, wallets) {
            found.push(sell);
        }
        Ok(found)
    }

    fn buy_opportunity(
        &self,
        pair: &AssetPair,
        book: &OrderBook,
        depth: &MarketDepthMetrics,
        trends: &PriceTrendMetrics,
        wallets: &WalletBalances,
    ) -> Option<TradeOpportunity> {
        let base_balance = wallets.balance(&self.base_currency);
        if base_balance <= self.config.min_base_balance {
            return None;
        }
        let ask = book.lowest_sell()?;
        let Some(order) = hawkeye_buy(ask.price, base_balance, &self.config) else {
            debug!(pair = %pair, ask = ask.price, "Buy sized to zero, discarded");
            return None;
        };

        let strategy = if depth.spread_percentage > self.config.market_making_spread {
            StrategyLabel::MarketMaking
        } else {
            StrategyLabel::TrendFollowing
        };

        Some(TradeOpportunity {
            asset_pair_id: pair.id,
            pair_name: pair.name(),
            action: Action::Buy,
            price: order.price,
            quantity: order.quantity,
            score: calculate_score(depth, trends, Action::Buy),
            strategy,
            reason: format!(
                "Spread {:.1}%, imbalance {:.2}, trend {:.1}%",
                depth.spread_percentage, depth.order_imbalance, trends.trend
            ),
            currency_to_trade: pair.primary_ticker.clone(),
            expected_profit: depth.spread_percentage * 0.5,
        })
    }

    fn sell_opportunity(
        &self,
        pair: &AssetPair,
        book: &OrderBook,
        depth: &MarketDepthMetrics,
        trends: &PriceTrendMetrics,
        wallets: &WalletBalances,
    ) -> Option<TradeOpportunity> {
        let held = wallets.balance(&pair.primary_ticker);
        if held <= 0 {
            return None;
        }
        let bid = book.highest_buy()?;
        let Some(order) = hawkeye_sell(bid.price, held, &self.config) else {
            debug!(pair = %pair, bid = bid.price, held, "Sell sized to zero, discarded");
            return None;
        };

        let strategy = if trends.trend > self.config.profit_taking_trend {
            StrategyLabel::ProfitTaking
        } else {
            StrategyLabel::RiskManagement
        };

        Some(TradeOpportunity {
            asset_pair_id: pair.id,
            pair_name: pair.name(),
            action: Action::Sell,
            price: order.price,
            quantity: order.quantity,
            score: calculate_score(depth, trends, Action::Sell),
            strategy,
            reason: format!(
                "Trend {:.1}%, momentum {:.1}%, volatility {:.1}",
                trends.trend, trends.momentum, trends.volatility
            ),
            currency_to_trade: pair.primary_ticker.clone(),
            expected_profit: depth.spread_percentage * 0.5,
        })
    }
}

#[async_trait]
impl OpportunitySelector for OpportunityRanker {
    fn name(&self) -> &'static str {
        "hawkeye"
    }

    async fn select(
        &mut self,
        api: &dyn ExchangeApi,
        wallets: &WalletBalances,
        history: &[TradeHistoryRecord],
        now: DateTime<Utc>,
    ) -> Result<Option<TradeOpportunity>, BotError> {
        let ranked = self.rank(api, wallets, history, now).await?;
        if let Some(top) = ranked.first() {
            info!(
                pair = %top.pair_name,
                action = %top.action,
                score = format!("{:.1}", top.score),
                strategy = %top.strategy,
                "Top opportunity"
            );
        }
        Ok(ranked.into_iter().next())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
