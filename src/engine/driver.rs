//! Iteration driver.
//!
//! One iteration walks `Authenticating → FetchingWallets → Evaluating →
//! Executing → Recording`. Failures end the iteration early but never the
//! loop; only an invalid schedule is fatal, and that is caught in `new`
//! before anything runs. Shutdown is checked between iterations only.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use secrecy::ExposeSecret;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::config::{AppConfig, Credentials, ScheduleConfig};
use crate::engine::executor::{ExecutedTrade, Executor};
use crate::engine::summary::{IterationReport, SessionSummary};
use crate::exchange::ExchangeApi;
use crate::storage::TradeJournal;
use crate::strategy::OpportunitySelector;
use crate::types::{BotError, TradeHistoryRecord, WalletBalances};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Authenticating,
    FetchingWallets,
    Evaluating,
    Executing,
    Recording,
    Done,
}

pub struct IterationDriver {
    bot_name: String,
    api: Arc<dyn ExchangeApi>,
    selector: Box<dyn OpportunitySelector>,
    executor: Executor,
    credentials: Credentials,
    schedule: ScheduleConfig,
    state: DriverState,
    wallets: WalletBalances,
    history: Vec<TradeHistoryRecord>,
    journal: Option<TradeJournal>,
    summary: SessionSummary,
    last_report: Option<IterationReport>,
}

/// Start awaiting `signal` now and return a future that resolves once it
/// has fired. A signal that lands mid-iteration is latched until the driver
/// next checks between iterations. A failing listener never resolves.
pub fn latch_shutdown<S>(signal: S) -> impl Future<Output = ()>
where
    S: Future<Output = std::io::Result<()>> + Send + 'static,
{
    let fired = Arc::new(Notify::new());
    let notifier = Arc::clone(&fired);
    tokio::spawn(async move {
        match signal.await {
            Ok(()) => {
                info!("Shutdown signal received, finishing current iteration");
                notifier.notify_one();
            }
            Err(e) => warn!(error = %e, "Failed to listen for shutdown signal"),
        }
    });
    async move { fired.notified().await }
}

impl IterationDriver {
    /// Fails with `BotError::Config` when the schedule cannot run.
    pub fn new(
        config: &AppConfig,
        api: Arc<dyn ExchangeApi>,
        selector: Box<dyn OpportunitySelector>,
        credentials: Credentials,
    ) -> Result<Self, BotError> {
        config.schedule.validate()?;

        Ok(Self {
            bot_name: config.bot.name.clone(),
            api,
            selector,
            executor: Executor::new(config.bot.dry_run),
            credentials,
            schedule: config.schedule,
            state: DriverState::Idle,
            wallets: WalletBalances::new(),
            history: Vec::new(),
            journal: config
                .bot
                .journal_path
                .as_ref()
                .map(|path| TradeJournal::new(path, &config.bot.name)),
            summary: SessionSummary::new(),
            last_report: None,
        })
    }

    /// Seed the trade history, e.g. from a replayed journal.
    pub fn with_history(mut self, history: Vec<TradeHistoryRecord>) -> Self {
        self.history = history;
        self
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn wallets(&self) -> &WalletBalances {
        &self.wallets
    }

    pub fn history(&self) -> &[TradeHistoryRecord] {
        &self.history
    }

    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    /// Outcome of the most recently recorded iteration.
    pub fn last_report(&self) -> Option<&IterationReport> {
        self.last_report.as_ref()
    }

    /// Run a single iteration against `history` and return what executed.
    ///
    /// Never fails: every error is logged and yields an empty result.
    pub async fn run_one_iteration(&mut self, history: &[TradeHistoryRecord]) -> Vec<ExecutedTrade> {
        let trades = self.iterate(history).await;
        self.state = DriverState::Idle;
        trades
    }

    async fn iterate(&mut self, history: &[TradeHistoryRecord]) -> Vec<ExecutedTrade> {
        self.state = DriverState::Authenticating;
        let login = self
            .api
            .login(&self.credentials.username, self.credentials.password.expose_secret())
            .await;
        if let Err(e) = login {
            error!(bot = %self.bot_name, error = %e, "Authentication failed, skipping iteration");
            return Vec::new();
        }
        debug!(bot = %self.bot_name, "Authenticated");

        self.state = DriverState::FetchingWallets;
        match self.api.get_wallets().await {
            Ok(wallets) => {
                self.wallets = WalletBalances::from_wallets(&wallets);
                info!(bot = %self.bot_name, wallets = %self.wallets, "Wallets refreshed");
            }
            Err(e) => {
                warn!(bot = %self.bot_name, error = %e, "Wallet fetch failed, using previous balances");
            }
        }

        self.state = DriverState::Evaluating;
        let selected = self
            .selector
            .select(self.api.as_ref(), &self.wallets, history, Utc::now())
            .await;
        let opportunity = match selected {
            Ok(Some(opportunity)) => opportunity,
            Ok(None) => {
                info!(bot = %self.bot_name, "No trade opportunity this iteration");
                return Vec::new();
            }
            Err(e) => {
                error!(bot = %self.bot_name, error = %e, "Evaluation aborted");
                return Vec::new();
            }
        };

        self.state = DriverState::Executing;
        info!(bot = %self.bot_name, opportunity = %opportunity, "Executing");
        match self.executor.execute(self.api.as_ref(), &opportunity).await {
            Some(trade) => vec![trade],
            None => Vec::new(),
        }
    }

    /// Fold executed trades into history, summary and journal.
    fn record(&mut self, trades: &[ExecutedTrade]) {
        self.state = DriverState::Recording;

        for trade in trades {
            self.history
                .push(TradeHistoryRecord::from_opportunity(&trade.opportunity, trade.executed_at));
        }
        self.last_report = Some(self.summary.reconcile(trades));

        if let Some(journal) = &self.journal {
            if let Err(e) = journal.append(trades) {
                warn!(path = %journal.path().display(), error = %e, "Journal write failed");
            }
        }
    }

    /// Loop until `max_iterations` is reached or `shutdown` resolves.
    pub async fn run<F>(&mut self, shutdown: F) -> SessionSummary
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!(
            bot = %self.bot_name,
            strategy = self.selector.name(),
            dry_run = self.executor.is_dry_run(),
            interval_secs = self.schedule.interval_secs,
            max_iterations = self.schedule.max_iterations,
            "Bot starting"
        );

        let mut iteration = 0u64;
        loop {
            iteration += 1;
            info!(bot = %self.bot_name, iteration, "Iteration starting");

            let history = std::mem::take(&mut self.history);
            let trades = self.run_one_iteration(&history).await;
            self.history = history;
            self.record(&trades);

            if self.schedule.max_iterations > 0 && iteration >= self.schedule.max_iterations {
                info!(bot = %self.bot_name, iteration, "Reached max iterations");
                break;
            }

            let pause = Duration::from_secs(self.schedule.interval_secs);
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!(bot = %self.bot_name, iteration, "Shutdown requested");
                    break;
                }
                _ = tokio::time::sleep(pause) => {}
            }
        }

        self.state = DriverState::Done;
        self.summary.log(&self.bot_name);
        self.summary.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
