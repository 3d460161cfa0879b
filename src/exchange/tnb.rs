//! thenewboston exchange REST client.
//!
//! Base URL: https://thenewboston.network/api
//! Auth: `POST /login` returns `authentication.access_token`, sent as
//! `Authorization: Bearer {token}` on every later request.
//! Listing endpoints answer either with a bare JSON array or with a
//! paginated `{ results, next }` envelope; both are accepted.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::ExchangeApi;
use crate::types::{
    lenient, AssetPair, BotError, OrderBook, OrderReceipt, OrderRequest, PricePoint, Wallet,
};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Upper bound on followed `next` links, in case the server loops.
const MAX_PAGES: usize = 500;

// ---------------------------------------------------------------------------
// API response types (exchange JSON → Rust)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Plain(Vec<T>),
    Page {
        results: Vec<T>,
        #[serde(default)]
        next: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
struct WireCurrency {
    #[serde(default)]
    ticker: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireAssetPair {
    id: i64,
    primary_currency: WireCurrency,
    secondary_currency: WireCurrency,
}

#[derive(Debug, Deserialize)]
struct WireWallet {
    #[serde(default)]
    currency: Option<WireCurrency>,
    #[serde(default, deserialize_with = "lenient::int")]
    balance: i64,
}

fn ticker_or_unknown(currency: Option<&WireCurrency>) -> String {
    currency
        .and_then(|c| c.ticker.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}

impl From<WireAssetPair> for AssetPair {
    fn from(wire: WireAssetPair) -> Self {
        AssetPair {
            id: wire.id,
            primary_ticker: ticker_or_unknown(Some(&wire.primary_currency)),
            secondary_ticker: ticker_or_unknown(Some(&wire.secondary_currency)),
        }
    }
}

impl From<WireWallet> for Wallet {
    fn from(wire: WireWallet) -> Self {
        Wallet {
            ticker: ticker_or_unknown(wire.currency.as_ref()),
            balance: wire.balance,
        }
    }
}

/// Pull `authentication.access_token` out of a login response body.
fn extract_access_token(body: &Value) -> Result<SecretString, BotError> {
    body.get("authentication")
        .and_then(|auth| auth.get("access_token"))
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(|token| SecretString::new(token.to_string()))
        .ok_or_else(|| {
            BotError::Auth("invalid login response: missing authentication.access_token".into())
        })
}

/// Chart data is only meaningful as an array; anything else is no data.
fn chart_points(body: Value) -> Vec<PricePoint> {
    match body {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or_default())
            .collect(),
        other => {
            debug!(kind = %json_kind(&other), "Chart data is not a list, treating as empty");
            Vec::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Build a receipt from the order-placement response.
fn receipt_from_response(order: &OrderRequest, body: &Value) -> OrderReceipt {
    let order_id = match body.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => uuid::Uuid::new_v4().to_string(),
    };
    OrderReceipt {
        order_id,
        asset_pair_id: order.asset_pair_id,
        price: order.price,
        quantity: order.quantity,
        side: order.action.side(),
        timestamp: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// thenewboston exchange client. One instance is one session.
pub struct TnbClient {
    http: Client,
    base_url: String,
    token: RwLock<Option<SecretString>>,
}

impl TnbClient {
    pub fn new(base_url: &str) -> Result<Self, BotError> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent("tnb-trader/0.1.0")
            .build()
            .map_err(|e| BotError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether `login` has succeeded on this session.
    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    // -- Internal helpers ------------------------------------------------

    async fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token.read().await.as_ref() {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    /// GET `url` and decode the body, mapping every failure to `Fetch`.
    async fn get_json<T: DeserializeOwned>(&self, url: &str, resource: &str) -> Result<T, BotError> {
        debug!(url = %url, resource, "GET");

        let request = self.authorize(self.http.get(url)).await;
        let resp = request
            .send()
            .await
            .map_err(|e| BotError::fetch(resource, format!("request failed: {e}")))?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(BotError::fetch(resource, format!("{status} - {body}")));
        }

        resp.json::<T>()
            .await
            .map_err(|e| BotError::fetch(resource, format!("malformed response: {e}")))
    }

    /// GET a listing endpoint, following `next` links when paginated.
    async fn get_listing<T: DeserializeOwned>(
        &self,
        path: &str,
        resource: &str,
    ) -> Result<Vec<T>, BotError> {
        let mut url = format!("{}{path}", self.base_url);
        let mut items = Vec::new();

        for page in 1..=MAX_PAGES {
            match self.get_json::<Listing<T>>(&url, resource).await? {
                Listing::Plain(all) => {
                    items.extend(all);
                    return Ok(items);
                }
                Listing::Page { results, next } => {
                    items.extend(results);
                    match next {
                        Some(next_url) if !next_url.is_empty() => url = next_url,
                        _ => {
                            debug!(resource, pages = page, total = items.len(), "Listing complete");
                            return Ok(items);
                        }
                    }
                }
            }
        }

        warn!(resource, max_pages = MAX_PAGES, "Pagination limit reached, truncating listing");
        Ok(items)
    }
}

// ---------------------------------------------------------------------------
// ExchangeApi trait implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl ExchangeApi for TnbClient {
    async fn login(&self, username: &str, password: &str) -> Result<SecretString, BotError> {
        let url = format!("{}/login", self.base_url);
        let payload = serde_json::json!({ "username": username, "password": password });

        let resp = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| BotError::Auth(format!("login request failed: {e}")))?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(BotError::Auth(format!("login failed: {status}")));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| BotError::Auth(format!("malformed login response: {e}")))?;
        let token = extract_access_token(&body)?;

        *self.token.write().await = Some(token.clone());
        info!(username, "Logged in");
        Ok(token)
    }

    async fn list_asset_pairs(&self) -> Result<Vec<AssetPair>, BotError> {
        let pairs: Vec<WireAssetPair> = self.get_listing("/asset-pairs", "asset pairs").await?;
        Ok(pairs.into_iter().map(AssetPair::from).collect())
    }

    async fn get_order_book(&self, asset_pair_id: i64) -> Result<OrderBook, BotError> {
        let url = format!("{}/exchange-orders/book?asset_pair={asset_pair_id}", self.base_url);
        self.get_json(&url, "order book").await
    }

    async fn get_price_history(
        &self,
        asset_pair_id: i64,
        range: &str,
    ) -> Result<Vec<PricePoint>, BotError> {
        let url = format!(
            "{}/trade-price-chart-data?asset_pair={asset_pair_id}&time_range={}",
            self.base_url,
            urlencoding::encode(range),
        );
        let body: Value = self.get_json(&url, "price history").await?;
        Ok(chart_points(body))
    }

    async fn get_wallets(&self) -> Result<Vec<Wallet>, BotError> {
        let wallets: Vec<WireWallet> = self.get_listing("/wallets", "wallets").await?;
        Ok(wallets.into_iter().map(Wallet::from).collect())
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderReceipt, BotError> {
        let url = format!("{}/exchange-orders", self.base_url);
        let payload = serde_json::json!({
            "asset_pair": order.asset_pair_id,
            "price": order.price,
            "quantity": order.quantity,
            "side": order.action.side(),
        });

        let request = self.authorize(self.http.post(&url).json(&payload)).await;
        let resp = request
            .send()
            .await
            .map_err(|e| BotError::order(format!("request failed: {e}")))?;

        let status = resp.status();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            let body = resp.text().await.unwrap_or_default();
            return Err(BotError::order(format!("{status} - {body}")));
        }

        let body: Value = resp.json().await.unwrap_or(Value::Null);
        let receipt = receipt_from_response(order, &body);

        info!(
            order_id = %receipt.order_id,
            asset_pair = order.asset_pair_id,
            side = %order.action,
            price = order.price,
            quantity = order.quantity,
            "Order placed"
        );

        Ok(receipt)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
