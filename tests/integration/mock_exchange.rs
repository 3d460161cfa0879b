//! Mock exchange for integration testing.
//!
//! Deterministic in-memory `ExchangeApi`: serves fixed pairs, order books,
//! chart data and wallets, records every submitted order, and can be told
//! to fail individual operations.

use async_trait::async_trait;
use chrono::Utc;
use secrecy::SecretString;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use tnb_trader::exchange::ExchangeApi;
use tnb_trader::types::*;

#[derive(Default)]
struct Failures {
    login: bool,
    wallets: bool,
    orders: bool,
    order_books: HashSet<i64>,
    price_history: HashSet<i64>,
}

/// All state is shared behind `Arc<Mutex<_>>` so test code can keep a clone
/// while the driver owns another.
#[derive(Clone, Default)]
pub struct MockExchange {
    pairs: Arc<Mutex<Vec<AssetPair>>>,
    books: Arc<Mutex<HashMap<i64, OrderBook>>>,
    charts: Arc<Mutex<HashMap<i64, Vec<PricePoint>>>>,
    wallets: Arc<Mutex<Vec<Wallet>>>,
    orders: Arc<Mutex<Vec<OrderRequest>>>,
    logins: Arc<Mutex<u32>>,
    failures: Arc<Mutex<Failures>>,
}

impl MockExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pair(self, pair: AssetPair, book: OrderBook) -> Self {
        self.books.lock().unwrap().insert(pair.id, book);
        self.pairs.lock().unwrap().push(pair);
        self
    }

    pub fn with_chart(self, pair_id: i64, prices: &[f64]) -> Self {
        let series = prices.iter().map(|&p| PricePoint::new(p)).collect();
        self.charts.lock().unwrap().insert(pair_id, series);
        self
    }

    pub fn with_wallet(self, ticker: &str, balance: i64) -> Self {
        self.wallets.lock().unwrap().push(Wallet::new(ticker, balance));
        self
    }

    pub fn fail_login(&self, fail: bool) {
        self.failures.lock().unwrap().login = fail;
    }

    pub fn fail_wallets(&self, fail: bool) {
        self.failures.lock().unwrap().wallets = fail;
    }

    pub fn fail_orders(&self, fail: bool) {
        self.failures.lock().unwrap().orders = fail;
    }

    pub fn fail_order_book(&self, pair_id: i64) {
        self.failures.lock().unwrap().order_books.insert(pair_id);
    }

    pub fn fail_price_history(&self, pair_id: i64) {
        self.failures.lock().unwrap().price_history.insert(pair_id);
    }

    pub fn set_wallets(&self, wallets: Vec<Wallet>) {
        *self.wallets.lock().unwrap() = wallets;
    }

    /// Orders submitted so far, in order.
    pub fn orders(&self) -> Vec<OrderRequest> {
        self.orders.lock().unwrap().clone()
    }

    pub fn login_count(&self) -> u32 {
        *self.logins.lock().unwrap()
    }
}

#[async_trait]
impl ExchangeApi for MockExchange {
    async fn login(&self, username: &str, _password: &str) -> Result<SecretString, BotError> {
        *self.logins.lock().unwrap() += 1;
        if self.failures.lock().unwrap().login {
            return Err(BotError::Auth(format!("invalid credentials for {username}")));
        }
        Ok(SecretString::new(format!("token-{}", Uuid::new_v4())))
    }

    async fn list_asset_pairs(&self) -> Result<Vec<AssetPair>, BotError> {
        Ok(self.pairs.lock().unwrap().clone())
    }

    async fn get_order_book(&self, asset_pair_id: i64) -> Result<OrderBook, BotError> {
        if self.failures.lock().unwrap().order_books.contains(&asset_pair_id) {
            return Err(BotError::fetch("order book", format!("pair {asset_pair_id} unavailable")));
        }
        Ok(self
            .books
            .lock()
            .unwrap()
            .get(&asset_pair_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_price_history(
        &self,
        asset_pair_id: i64,
        _range: &str,
    ) -> Result<Vec<PricePoint>, BotError> {
        if self.failures.lock().unwrap().price_history.contains(&asset_pair_id) {
            return Err(BotError::fetch("price history", "timeout"));
        }
        Ok(self
            .charts
            .lock()
            .unwrap()
            .get(&asset_pair_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_wallets(&self) -> Result<Vec<Wallet>, BotError> {
        if self.failures.lock().unwrap().wallets {
            return Err(BotError::fetch("wallets", "HTTP 500"));
        }
        Ok(self.wallets.lock().unwrap().clone())
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderReceipt, BotError> {
        if self.failures.lock().unwrap().orders {
            return Err(BotError::order("HTTP 400: rejected"));
        }
        self.orders.lock().unwrap().push(*order);
        Ok(OrderReceipt {
            order_id: Uuid::new_v4().to_string(),
            asset_pair_id: order.asset_pair_id,
            price: order.price,
            quantity: order.quantity,
            side: order.action.side(),
            timestamp: Utc::now(),
        })
    }
}

/// Book with the given bids and asks as `(price, quantity)` pairs.
pub fn make_book(buys: &[(i64, i64)], sells: &[(i64, i64)]) -> OrderBook {
    OrderBook::new(
        buys.iter().map(|&(p, q)| BookEntry::new(p, q)).collect(),
        sells.iter().map(|&(p, q)| BookEntry::new(p, q)).collect(),
    )
}
