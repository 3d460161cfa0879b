//! Randomized selector for the "Randy" bot.
//!
//! No scoring: flips a weighted coin between selling a random holding and
//! buying on a random pair, then sizes off the pair's order book. The RNG is
//! a type parameter so tests can seed it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use crate::analysis::summarize_order_book;
use crate::config::RandyConfig;
use crate::exchange::ExchangeApi;
use crate::strategy::sizing::{randy_buy, randy_sell};
use crate::strategy::OpportunitySelector;
use crate::types::{
    Action, AssetPair, BotError, StrategyLabel, TradeHistoryRecord, TradeOpportunity, WalletBalances,
};

/// Outcome of the coin flip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RandomDecision {
    Buy,
    Sell { ticker: String },
}

pub struct RandomSelector<R = StdRng> {
    config: RandyConfig,
    base_currency: String,
    rng: R,
}

impl RandomSelector<StdRng> {
    pub fn from_entropy(config: RandyConfig, base_currency: &str) -> Self {
        Self::with_rng(config, base_currency, StdRng::from_entropy())
    }
}

impl<R: Rng + Send> RandomSelector<R> {
    pub fn with_rng(config: RandyConfig, base_currency: &str, rng: R) -> Self {
        Self {
            config,
            base_currency: base_currency.to_string(),
            rng,
        }
    }

    /// Sell a random non-base holding with `sell_probability`, else buy.
    pub fn decide(&mut self, wallets: &WalletBalances) -> RandomDecision {
        let holdings = wallets.holdings_except(&self.base_currency);
        if holdings.is_empty() || !self.rng.gen_bool(self.config.sell_probability) {
            return RandomDecision::Buy;
        }
        match holdings.choose(&mut self.rng) {
            Some((ticker, _)) => RandomDecision::Sell {
                ticker: ticker.clone(),
            },
            None => RandomDecision::Buy,
        }
    }

    fn pick_pair<'a>(&mut self, decision: &mut RandomDecision, pairs: &'a [AssetPair]) -> Option<&'a AssetPair> {
        if let RandomDecision::Sell { ticker } = decision {
            if let Some(pair) = pairs.iter().find(|p| p.primary_ticker == *ticker) {
                return Some(pair);
            }
            warn!(currency = %ticker, "No asset pair for currency, falling back to buy");
            *decision = RandomDecision::Buy;
        }
        pairs.choose(&mut self.rng)
    }
}

#[async_trait]
impl<R: Rng + Send> OpportunitySelector for RandomSelector<R> {
    fn name(&self) -> &'static str {
        "randy"
    }

    async fn select(
        &mut self,
        api: &dyn ExchangeApi,
        wallets: &WalletBalances,
        _history: &[TradeHistoryRecord],
        _now: DateTime<Utc>,
    ) -> Result<Option<TradeOpportunity>, BotError> {
        let pairs = api.list_asset_pairs().await?;
        if pairs.is_empty() {
            warn!("No asset pairs available");
            return Ok(None);
        }

        let mut decision = self.decide(wallets);
        let Some(pair) = self.pick_pair(&mut decision, &pairs).cloned() else {
            return Ok(None);
        };
        info!(pair = %pair, decision = ?decision, "Trade decision");

        let book = api.get_order_book(pair.id).await?;
        let summary = summarize_order_book(&book);
        info!(
            pair = %pair,
            buy_orders = summary.buy_orders_count,
            sell_orders = summary.sell_orders_count,
            highest_buy = ?summary.highest_buy.map(|e| e.price),
            lowest_sell = ?summary.lowest_sell.map(|e| e.price),
            spread = ?summary.spread,
            "Order book"
        );

        let (action, currency, sized) = match &decision {
            RandomDecision::Sell { ticker } => {
                let held = wallets.balance(ticker);
                if held <= 0 {
                    warn!(currency = %ticker, "No balance to sell");
                    return Ok(None);
                }
                let fraction = self.rng.gen_range(self.config.min_sell_fraction..1.0);
                (
                    Action::Sell,
                    ticker.clone(),
                    randy_sell(&book, held, fraction, &self.config),
                )
            }
            RandomDecision::Buy => {
                let base_balance = wallets.balance(&self.base_currency);
                if base_balance <= self.config.min_balance_required {
                    warn!(
                        currency = %self.base_currency,
                        balance = base_balance,
                        "Insufficient balance to buy"
                    );
                    return Ok(None);
                }
                (
                    Action::Buy,
                    pair.primary_ticker.clone(),
                    randy_buy(&book, base_balance, &self.config),
                )
            }
        };

        let Some(order) = sized else {
            warn!(pair = %pair, action = %action, "Invalid order parameters, skipping");
            return Ok(None);
        };

        Ok(Some(TradeOpportunity {
            asset_pair_id: pair.id,
            pair_name: pair.name(),
            action,
            price: order.price,
            quantity: order.quantity,
            score: 0.0,
            strategy: StrategyLabel::Random,
            reason: format!("Random {} of {currency}", action.to_string().to_lowercase()),
            currency_to_trade: currency,
            expected_profit: 0.0,
        }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
