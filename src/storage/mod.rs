//! Trade journal.
//!
//! Appends each executed trade as one JSON line. On startup the journal can
//! be replayed into trade-history records so the recency penalty survives a
//! restart.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::engine::executor::{ExecutedTrade, DRY_RUN_ORDER_PREFIX};
use crate::types::{Action, StrategyLabel, TradeHistoryRecord};

/// One line of the journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub timestamp: DateTime<Utc>,
    pub bot: String,
    pub pair: String,
    pub asset_pair_id: i64,
    pub action: Action,
    pub price: i64,
    pub quantity: i64,
    pub total_value: i64,
    pub score: f64,
    pub strategy: StrategyLabel,
    pub order_id: String,
}

impl JournalEntry {
    pub fn from_trade(bot: &str, trade: &ExecutedTrade) -> Self {
        let opp = &trade.opportunity;
        Self {
            timestamp: trade.executed_at,
            bot: bot.to_string(),
            pair: opp.pair_name.clone(),
            asset_pair_id: opp.asset_pair_id,
            action: opp.action,
            price: opp.price,
            quantity: opp.quantity,
            total_value: opp.total_value(),
            score: opp.score,
            strategy: opp.strategy,
            order_id: trade.receipt.order_id.clone(),
        }
    }

    /// Logged in dry-run mode; never reached the exchange.
    pub fn is_dry_run(&self) -> bool {
        self.order_id.starts_with(DRY_RUN_ORDER_PREFIX)
    }

    pub fn to_history_record(&self) -> TradeHistoryRecord {
        TradeHistoryRecord {
            pair_name: self.pair.clone(),
            action: self.action,
            timestamp: self.timestamp,
            price: self.price,
            quantity: self.quantity,
        }
    }
}

pub struct TradeJournal {
    path: PathBuf,
    bot: String,
}

impl TradeJournal {
    pub fn new(path: impl Into<PathBuf>, bot: &str) -> Self {
        Self {
            path: path.into(),
            bot: bot.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append trades, one JSON object per line.
    pub fn append(&self, trades: &[ExecutedTrade]) -> Result<()> {
        if trades.is_empty() {
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open journal {}", self.path.display()))?;

        for trade in trades {
            let line = serde_json::to_string(&JournalEntry::from_trade(&self.bot, trade))
                .context("Failed to serialise journal entry")?;
            writeln!(file, "{line}")
                .with_context(|| format!("Failed to write journal {}", self.path.display()))?;
        }

        debug!(path = %self.path.display(), count = trades.len(), "Journal updated");
        Ok(())
    }

    /// Read every entry. A missing file is an empty journal; unparseable
    /// lines are skipped with a warning.
    pub fn load(&self) -> Result<Vec<JournalEntry>> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "No journal found, starting fresh");
            return Ok(Vec::new());
        }

        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read journal {}", self.path.display()))?;

        let mut entries = Vec::new();
        for (index, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<JournalEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(line = index + 1, error = %e, "Skipping malformed journal line"),
            }
        }

        info!(path = %self.path.display(), entries = entries.len(), "Journal loaded");
        Ok(entries)
    }

    /// Replay this bot's real trades as history, oldest first. Dry-run
    /// entries stay in the file but are not replayed.
    pub fn load_history(&self) -> Result<Vec<TradeHistoryRecord>> {
        let entries = self.load()?;
        let skipped = entries.iter().filter(|e| e.bot == self.bot && e.is_dry_run()).count();
        if skipped > 0 {
            debug!(skipped, "Ignoring dry-run journal entries");
        }
        Ok(entries
            .iter()
            .filter(|e| e.bot == self.bot && !e.is_dry_run())
            .map(JournalEntry::to_history_record)
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
