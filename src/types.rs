//! Shared types for the trading bots.
//!
//! These types form the data model used across all modules. Exchange
//! payloads are converted into these records at the client boundary so
//! the analysis and strategy code never touches raw JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Order book
// ---------------------------------------------------------------------------

/// A single resting order level. Prices and quantities are integers in the
/// exchange's base unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookEntry {
    #[serde(default, deserialize_with = "lenient::int")]
    pub price: i64,
    #[serde(default, deserialize_with = "lenient::int")]
    pub quantity: i64,
}

impl BookEntry {
    pub fn new(price: i64, quantity: i64) -> Self {
        Self { price, quantity }
    }

    /// A level that can actually be traded against.
    pub fn is_live(&self) -> bool {
        self.price > 0 && self.quantity > 0
    }
}

/// Snapshot of resting orders for one asset pair. No ordering is assumed
/// on either side. Levels with a non-positive price or quantity are dropped
/// when decoding an exchange payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    #[serde(default, deserialize_with = "live_entries")]
    pub buy_orders: Vec<BookEntry>,
    #[serde(default, deserialize_with = "live_entries")]
    pub sell_orders: Vec<BookEntry>,
}

fn live_entries<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Vec<BookEntry>, D::Error> {
    let entries = Vec::<BookEntry>::deserialize(d)?;
    Ok(entries.into_iter().filter(BookEntry::is_live).collect())
}

impl OrderBook {
    pub fn new(buy_orders: Vec<BookEntry>, sell_orders: Vec<BookEntry>) -> Self {
        Self {
            buy_orders,
            sell_orders,
        }
    }

    /// Best live bid.
    pub fn highest_buy(&self) -> Option<&BookEntry> {
        self.buy_orders.iter().filter(|o| o.is_live()).max_by_key(|o| o.price)
    }

    /// Best live ask.
    pub fn lowest_sell(&self) -> Option<&BookEntry> {
        self.sell_orders.iter().filter(|o| o.is_live()).min_by_key(|o| o.price)
    }
}

// ---------------------------------------------------------------------------
// Price history
// ---------------------------------------------------------------------------

/// One point of a trade-price chart series (oldest first). Points with a
/// missing or zero price are skipped by the analyzer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    #[serde(default, deserialize_with = "lenient::opt_float")]
    pub price: Option<f64>,
}

impl PricePoint {
    pub fn new(price: f64) -> Self {
        Self { price: Some(price) }
    }
}

// ---------------------------------------------------------------------------
// Asset pairs and wallets
// ---------------------------------------------------------------------------

/// A tradable market, e.g. `TUNA/TNB`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPair {
    pub id: i64,
    pub primary_ticker: String,
    pub secondary_ticker: String,
}

impl AssetPair {
    pub fn new(id: i64, primary: &str, secondary: &str) -> Self {
        Self {
            id,
            primary_ticker: primary.to_string(),
            secondary_ticker: secondary.to_string(),
        }
    }

    /// Display name used as the recency-penalty key.
    pub fn name(&self) -> String {
        format!("{}/{}", self.primary_ticker, self.secondary_ticker)
    }
}

impl fmt::Display for AssetPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} (#{})", self.primary_ticker, self.secondary_ticker, self.id)
    }
}

/// One wallet as reported by the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub ticker: String,
    pub balance: i64,
}

impl Wallet {
    pub fn new(ticker: &str, balance: i64) -> Self {
        Self {
            ticker: ticker.to_string(),
            balance,
        }
    }
}

/// Ticker → balance snapshot. Replaced wholesale on every fetch.
///
/// Backed by a `BTreeMap` so iteration order is stable, which keeps the
/// randomized bot reproducible under a seeded generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBalances(BTreeMap<String, i64>);

impl WalletBalances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_wallets(wallets: &[Wallet]) -> Self {
        Self(
            wallets
                .iter()
                .map(|w| (w.ticker.clone(), w.balance.max(0)))
                .collect(),
        )
    }

    /// Balance for `ticker`, zero if absent.
    pub fn balance(&self, ticker: &str) -> i64 {
        self.0.get(ticker).copied().unwrap_or(0)
    }

    /// Positive holdings of every currency other than `base`.
    pub fn holdings_except(&self, base: &str) -> Vec<(String, i64)> {
        self.0
            .iter()
            .filter(|(ticker, balance)| ticker.as_str() != base && **balance > 0)
            .map(|(ticker, balance)| (ticker.clone(), *balance))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for WalletBalances {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(t, b)| format!("{t}={b}")).collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

// ---------------------------------------------------------------------------
// Actions and opportunities
// ---------------------------------------------------------------------------

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Buy,
    Sell,
}

impl Action {
    /// Exchange wire encoding: buy = 1, sell = -1.
    pub fn side(&self) -> i8 {
        match self {
            Action::Buy => 1,
            Action::Sell => -1,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => write!(f, "BUY"),
            Action::Sell => write!(f, "SELL"),
        }
    }
}

/// Which heuristic produced an opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyLabel {
    MarketMaking,
    TrendFollowing,
    ProfitTaking,
    RiskManagement,
    Random,
}

impl fmt::Display for StrategyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyLabel::MarketMaking => write!(f, "Market Making"),
            StrategyLabel::TrendFollowing => write!(f, "Trend Following"),
            StrategyLabel::ProfitTaking => write!(f, "Profit Taking"),
            StrategyLabel::RiskManagement => write!(f, "Risk Management"),
            StrategyLabel::Random => write!(f, "Random"),
        }
    }
}

/// A scored, sized candidate trade. Never mutated after it leaves the
/// ranker; the only field the ranker rewrites before handing it over is
/// `score` (recency penalty).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOpportunity {
    pub asset_pair_id: i64,
    pub pair_name: String,
    pub action: Action,
    pub price: i64,
    pub quantity: i64,
    /// 0–100.
    pub score: f64,
    pub strategy: StrategyLabel,
    pub reason: String,
    pub currency_to_trade: String,
    /// Percent.
    pub expected_profit: f64,
}

impl TradeOpportunity {
    /// Notional value in base currency.
    pub fn total_value(&self) -> i64 {
        self.price.saturating_mul(self.quantity)
    }

    /// Price and quantity must both be strictly positive.
    pub fn is_valid(&self) -> bool {
        self.price > 0 && self.quantity > 0
    }
}

impl fmt::Display for TradeOpportunity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} @ {} ({}, score {:.1})",
            self.action,
            self.quantity,
            self.currency_to_trade,
            self.price,
            self.strategy,
            self.score,
        )
    }
}

// ---------------------------------------------------------------------------
// Trade history
// ---------------------------------------------------------------------------

/// Append-only record of an executed trade, consumed by the recency penalty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeHistoryRecord {
    pub pair_name: String,
    pub action: Action,
    pub timestamp: DateTime<Utc>,
    pub price: i64,
    pub quantity: i64,
}

impl TradeHistoryRecord {
    pub fn from_opportunity(opportunity: &TradeOpportunity, timestamp: DateTime<Utc>) -> Self {
        Self {
            pair_name: opportunity.pair_name.clone(),
            action: opportunity.action,
            timestamp,
            price: opportunity.price,
            quantity: opportunity.quantity,
        }
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// Parameters submitted to the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderRequest {
    pub asset_pair_id: i64,
    pub price: i64,
    pub quantity: i64,
    pub action: Action,
}

impl OrderRequest {
    pub fn from_opportunity(opportunity: &TradeOpportunity) -> Self {
        Self {
            asset_pair_id: opportunity.asset_pair_id,
            price: opportunity.price,
            quantity: opportunity.quantity,
            action: opportunity.action,
        }
    }
}

/// Confirmation of a submitted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: String,
    pub asset_pair_id: i64,
    pub price: i64,
    pub quantity: i64,
    pub side: i8,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Error taxonomy for the bots. Everything except `Config` is recoverable
/// at the iteration level.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BotError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Failed to fetch {resource}: {message}")]
    Fetch { resource: String, message: String },

    #[error("Order rejected: {message}")]
    Order { message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BotError {
    pub fn fetch(resource: &str, message: impl Into<String>) -> Self {
        BotError::Fetch {
            resource: resource.to_string(),
            message: message.into(),
        }
    }

    pub fn order(message: impl Into<String>) -> Self {
        BotError::Order {
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Lenient numeric decoding
// ---------------------------------------------------------------------------

/// The exchange is inconsistent about numbers: balances and prices arrive
/// as JSON numbers or numeric strings. Integers truncate toward zero.
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn int<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        Ok(to_int(&Value::deserialize(d)?).unwrap_or(0))
    }

    pub fn opt_float<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(to_float(&Value::deserialize(d)?))
    }

    pub fn to_int(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            }
            _ => None,
        }
    }

    pub fn to_float(value: &Value) -> Option<f64> {
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed.filter(|f| f.is_finite())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
