//! Exchange integration.
//!
//! Defines the `ExchangeApi` trait, the only way the bots talk to the
//! outside world, and provides the thenewboston REST implementation.
//! Every method returns a typed `BotError`; callers decide per call site
//! whether a failure aborts the iteration or degrades it.

pub mod tnb;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::types::{AssetPair, BotError, OrderBook, OrderReceipt, OrderRequest, PricePoint, Wallet};

/// Abstraction over the exchange REST API.
///
/// Implementors own their session: a successful `login` authenticates every
/// later call on the same instance. Timeouts and transport retries are the
/// implementor's concern.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExchangeApi: Send + Sync {
    /// Authenticate and return the access token.
    async fn login(&self, username: &str, password: &str) -> Result<SecretString, BotError>;

    /// All tradable asset pairs.
    async fn list_asset_pairs(&self) -> Result<Vec<AssetPair>, BotError>;

    /// Current resting orders for a pair.
    async fn get_order_book(&self, asset_pair_id: i64) -> Result<OrderBook, BotError>;

    /// Trade-price chart series for a pair, oldest first.
    async fn get_price_history(
        &self,
        asset_pair_id: i64,
        range: &str,
    ) -> Result<Vec<PricePoint>, BotError>;

    /// Balances of the authenticated account.
    async fn get_wallets(&self) -> Result<Vec<Wallet>, BotError>;

    /// Submit a limit order. Called at most once per opportunity.
    async fn place_order(&self, order: &OrderRequest) -> Result<OrderReceipt, BotError>;
}
