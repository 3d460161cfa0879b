//! Strategy layer: scoring, sizing and the two opportunity selectors.

pub mod random;
pub mod ranker;
pub mod scoring;
pub mod sizing;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::{AppConfig, BotKind};
use crate::exchange::ExchangeApi;
use crate::types::{BotError, TradeHistoryRecord, TradeOpportunity, WalletBalances};
use random::RandomSelector;
use ranker::OpportunityRanker;

/// Picks at most one opportunity per iteration.
///
/// `Err` is reserved for failures that leave nothing to evaluate (e.g. the
/// pair listing is unavailable); everything else degrades to `Ok(None)`.
#[async_trait]
pub trait OpportunitySelector: Send {
    fn name(&self) -> &'static str;

    async fn select(
        &mut self,
        api: &dyn ExchangeApi,
        wallets: &WalletBalances,
        history: &[TradeHistoryRecord],
        now: DateTime<Utc>,
    ) -> Result<Option<TradeOpportunity>, BotError>;
}

/// Build the selector for the configured bot kind.
pub fn build_selector(config: &AppConfig) -> Box<dyn OpportunitySelector> {
    let base = &config.bot.base_currency;
    match config.bot.kind {
        BotKind::Hawkeye => Box::new(OpportunityRanker::new(
            config.hawkeye.clone(),
            base,
            config.recency,
        )),
        BotKind::Randy => Box::new(RandomSelector::from_entropy(config.randy.clone(), base)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(kind: BotKind) -> AppConfig {
        let mut config = AppConfig::from_toml_str(
            r#"
            [bot]
            name = "test"
            kind = "hawkeye"
            api_base_url = "http://localhost"
            "#,
        )
        .unwrap();
        config.bot.kind = kind;
        config
    }

    #[test]
    fn test_build_selector_per_kind() {
        assert_eq!(build_selector(&make_config(BotKind::Hawkeye)).name(), "hawkeye");
        assert_eq!(build_selector(&make_config(BotKind::Randy)).name(), "randy");
    }
}
