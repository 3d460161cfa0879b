//! tnb-trader: Hawkeye and Randy trading bots for thenewboston exchange.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! replays the trade journal (if any) and runs the iteration loop until the
//! iteration cap is hit or Ctrl-C is pressed. The `report` subcommand
//! writes a sell-side order book report instead of trading.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use secrecy::ExposeSecret;
use tracing::{info, warn};

use tnb_trader::config::{AppConfig, BotKind, Credentials};
use tnb_trader::engine::driver::{latch_shutdown, IterationDriver};
use tnb_trader::exchange::tnb::TnbClient;
use tnb_trader::exchange::ExchangeApi;
use tnb_trader::report;
use tnb_trader::storage::TradeJournal;
use tnb_trader::strategy::build_selector;

#[derive(Debug, Parser)]
#[command(name = "tnb-trader", version, about = "Opportunity-scoring trading bots for thenewboston")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config.toml")]
    config: String,

    /// Override the configured bot strategy.
    #[arg(long, value_enum)]
    bot: Option<BotKind>,

    /// Override the iteration cap (0 = unbounded).
    #[arg(long)]
    iterations: Option<u64>,

    /// Run a single iteration and exit.
    #[arg(long, default_value_t = false)]
    once: bool,

    /// Log orders instead of submitting them.
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write a Markdown report of resting sell orders across all markets.
    Report {
        /// Output file. Defaults to a timestamped name in the working directory.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cli = Cli::parse();
    let mut cfg = AppConfig::load(&cli.config)?;
    apply_overrides(&mut cfg, &cli);

    init_logging();

    info!(
        bot = %cfg.bot.name,
        kind = ?cfg.bot.kind,
        api = %cfg.bot.api_base_url,
        dry_run = cfg.bot.dry_run,
        "tnb-trader starting up"
    );

    let credentials = cfg.credentials()?;
    let api: Arc<dyn ExchangeApi> = Arc::new(TnbClient::new(&cfg.bot.api_base_url)?);

    if let Some(Command::Report { output }) = &cli.command {
        return write_report(api.as_ref(), &credentials, output.clone()).await;
    }

    let selector = build_selector(&cfg);

    let history = match &cfg.bot.journal_path {
        Some(path) => TradeJournal::new(path, &cfg.bot.name)
            .load_history()
            .unwrap_or_else(|e| {
                warn!(path = %path, error = %e, "Could not replay journal, starting with empty history");
                Vec::new()
            }),
        None => Vec::new(),
    };
    if !history.is_empty() {
        info!(records = history.len(), "Trade history restored from journal");
    }

    let mut driver = IterationDriver::new(&cfg, api, selector, credentials)
        .context("Invalid schedule configuration")?
        .with_history(history);

    // Listen before the first iteration so Ctrl-C never lands unhandled.
    let shutdown = latch_shutdown(tokio::signal::ctrl_c());

    let summary = driver.run(shutdown).await;
    info!(
        iterations = summary.iterations,
        trades = summary.total_trades,
        "tnb-trader shut down"
    );

    Ok(())
}

/// Log in, collect every market's asks and write the Markdown report.
async fn write_report(
    api: &dyn ExchangeApi,
    credentials: &Credentials,
    output: Option<PathBuf>,
) -> Result<()> {
    api.login(&credentials.username, credentials.password.expose_secret())
        .await
        .context("Login failed")?;

    let data = report::collect_sell_side(api)
        .await
        .context("Failed to collect order books")?;

    let now = Utc::now();
    let path = output.unwrap_or_else(|| PathBuf::from(report::report_file_name(now)));
    std::fs::write(&path, report::render_markdown(&data, now))
        .with_context(|| format!("Failed to write report {}", path.display()))?;

    info!(path = %path.display(), currencies = data.len(), "Report saved");
    Ok(())
}

fn apply_overrides(cfg: &mut AppConfig, cli: &Cli) {
    if let Some(kind) = cli.bot {
        cfg.bot.kind = kind;
    }
    if let Some(n) = cli.iterations {
        cfg.schedule.max_iterations = n;
    }
    if cli.once {
        cfg.schedule.max_iterations = 1;
    }
    if cli.dry_run {
        cfg.bot.dry_run = true;
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tnb_trader=info"));

    let json_logging = std::env::var("TNB_TRADER_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
