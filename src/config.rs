//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every tuning section falls back to the bots' historical constants when
//! omitted. Credentials are referenced by env-var name in the config and
//! resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;

use crate::types::BotError;

const DEFAULT_API_BASE_URL: &str = "https://thenewboston.network/api";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub bot: BotConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub hawkeye: HawkeyeConfig,
    #[serde(default)]
    pub randy: RandyConfig,
    #[serde(default)]
    pub recency: RecencyConfig,
}

/// Which strategy drives the bot.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BotKind {
    /// Scores every pair and trades the best opportunity.
    Hawkeye,
    /// Picks a random pair and side.
    Randy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BotConfig {
    pub name: String,
    pub kind: BotKind,
    #[serde(default = "default_username_env")]
    pub username_env: String,
    #[serde(default = "default_password_env")]
    pub password_env: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Log orders instead of submitting them.
    #[serde(default)]
    pub dry_run: bool,
    /// Append executed trades to this JSON-lines file.
    #[serde(default)]
    pub journal_path: Option<String>,
    /// Currency the bot spends when buying.
    #[serde(default = "default_base_currency")]
    pub base_currency: String,
}

fn default_username_env() -> String {
    "TNB_USERNAME".to_string()
}

fn default_password_env() -> String {
    "TNB_PASSWORD".to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_base_currency() -> String {
    "TNB".to_string()
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Seconds to wait between iterations (0 = no wait).
    pub interval_secs: u64,
    /// Iterations before exiting (0 = unbounded).
    pub max_iterations: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            max_iterations: 0,
        }
    }
}

impl ScheduleConfig {
    /// A zero interval with no iteration cap would spin forever.
    pub fn validate(&self) -> Result<(), BotError> {
        if self.interval_secs == 0 && self.max_iterations == 0 {
            return Err(BotError::Config(
                "interval_secs and max_iterations cannot both be 0; set at least one".into(),
            ));
        }
        Ok(())
    }
}

/// Sizing and labelling constants for the scoring bot.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct HawkeyeConfig {
    /// Base balance must exceed this before buys are considered.
    pub min_base_balance: i64,
    pub max_spend_fraction: f64,
    pub max_spend_cap: i64,
    pub sell_fraction: f64,
    pub max_sell_quantity: i64,
    /// Buy target = lowest ask × discount.
    pub buy_discount: f64,
    /// Sell target = highest bid × markup.
    pub sell_markup: f64,
    /// Chart window requested from the exchange.
    pub chart_range: String,
    /// Spread (%) above which a buy is labelled market making.
    pub market_making_spread: f64,
    /// Trend (%) above which a sell is labelled profit taking.
    pub profit_taking_trend: f64,
}

impl Default for HawkeyeConfig {
    fn default() -> Self {
        Self {
            min_base_balance: 100,
            max_spend_fraction: 0.30,
            max_spend_cap: 500,
            sell_fraction: 0.50,
            max_sell_quantity: 100,
            buy_discount: 0.98,
            sell_markup: 1.02,
            chart_range: "1d".to_string(),
            market_making_spread: 5.0,
            profit_taking_trend: 10.0,
        }
    }
}

/// Constants for the randomized bot.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RandyConfig {
    /// Chance of selling a held currency instead of buying (0–1).
    pub sell_probability: f64,
    pub min_balance_required: i64,
    pub max_spend_fraction: f64,
    pub max_spend_per_trade: i64,
    pub buy_discount: f64,
    pub sell_markup: f64,
    /// Lower bound of the random liquidation fraction (upper bound is 1).
    pub min_sell_fraction: f64,
    pub fallback_buy_price: i64,
    pub fallback_buy_quantity: i64,
    pub fallback_sell_price: i64,
    pub fallback_sell_quantity: i64,
}

impl Default for RandyConfig {
    fn default() -> Self {
        Self {
            sell_probability: 0.25,
            min_balance_required: 100,
            max_spend_fraction: 0.10,
            max_spend_per_trade: 100,
            buy_discount: 0.95,
            sell_markup: 1.05,
            min_sell_fraction: 0.25,
            fallback_buy_price: 4,
            fallback_buy_quantity: 20,
            fallback_sell_price: 10,
            fallback_sell_quantity: 50,
        }
    }
}

/// Cooldown applied to recently traded pairs.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct RecencyConfig {
    pub window_minutes: f64,
    pub max_penalty: f64,
}

impl Default for RecencyConfig {
    fn default() -> Self {
        Self {
            window_minutes: 10.0,
            max_penalty: 30.0,
        }
    }
}

/// Resolved login credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: SecretString::new(password.to_string()),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject combinations that cannot run.
    pub fn validate(&self) -> Result<(), BotError> {
        self.schedule.validate()?;
        if !(0.0..=1.0).contains(&self.randy.sell_probability) {
            return Err(BotError::Config(format!(
                "randy.sell_probability must be within [0, 1], got {}",
                self.randy.sell_probability
            )));
        }
        if !(0.0..1.0).contains(&self.randy.min_sell_fraction) {
            return Err(BotError::Config(format!(
                "randy.min_sell_fraction must be within [0, 1), got {}",
                self.randy.min_sell_fraction
            )));
        }
        if self.recency.window_minutes <= 0.0 {
            return Err(BotError::Config("recency.window_minutes must be positive".into()));
        }
        Ok(())
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    /// Read the bot's username and password from the configured env vars.
    pub fn credentials(&self) -> Result<Credentials> {
        let username = Self::resolve_env(&self.bot.username_env)?;
        let password = Self::resolve_env(&self.bot.password_env)?;
        Ok(Credentials {
            username,
            password: SecretString::new(password),
        })
    }
}
