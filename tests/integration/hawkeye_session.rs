//! Scoring-bot sessions: ranking, recency rotation, failure isolation and
//! journal replay through the full driver.

use std::sync::Arc;

use tnb_trader::config::{AppConfig, Credentials};
use tnb_trader::engine::driver::IterationDriver;
use tnb_trader::storage::TradeJournal;
use tnb_trader::strategy::build_selector;
use tnb_trader::types::{Action, AssetPair, OrderRequest, Wallet};

use crate::mock_exchange::{make_book, MockExchange};

fn make_config(max_iterations: u64) -> AppConfig {
    AppConfig::from_toml_str(&format!(
        r#"
        [bot]
        name = "hawkeye-it"
        kind = "hawkeye"

        [schedule]
        interval_secs = 0
        max_iterations = {max_iterations}
        "#
    ))
    .unwrap()
}

fn make_driver(config: &AppConfig, exchange: &MockExchange) -> IterationDriver {
    IterationDriver::new(
        config,
        Arc::new(exchange.clone()),
        build_selector(config),
        Credentials::new("hawkeye", "secret"),
    )
    .unwrap()
}

/// Two indistinguishable ask-only markets.
fn make_twin_exchange() -> MockExchange {
    MockExchange::new()
        .with_pair(AssetPair::new(1, "AAA", "TNB"), make_book(&[], &[(100, 10)]))
        .with_pair(AssetPair::new(2, "BBB", "TNB"), make_book(&[], &[(100, 10)]))
        .with_wallet("TNB", 1000)
}

fn temp_journal() -> std::path::PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("tnb_trader_it_{}.jsonl", uuid::Uuid::new_v4()));
    p
}

#[tokio::test]
async fn test_best_pair_traded_despite_failing_neighbour() {
    let exchange = MockExchange::new()
        .with_pair(AssetPair::new(1, "TUNA", "TNB"), make_book(&[(95, 10)], &[(100, 10)]))
        .with_chart(1, &[10.0, 10.0, 10.0])
        .with_pair(AssetPair::new(2, "BEAN", "TNB"), make_book(&[], &[(10, 10)]))
        .with_pair(AssetPair::new(3, "CORN", "TNB"), make_book(&[(40, 2)], &[(50, 20)]))
        .with_wallet("TNB", 1000);
    exchange.fail_order_book(2);
    exchange.fail_price_history(3);

    let config = make_config(1);
    let mut driver = make_driver(&config, &exchange);
    let summary = driver.run(std::future::pending()).await;

    assert_eq!(
        exchange.orders(),
        vec![OrderRequest {
            asset_pair_id: 3,
            price: 49,
            quantity: 6,
            action: Action::Buy,
        }]
    );
    assert_eq!(summary.total_trades, 1);
    assert_eq!(summary.total_value, 49 * 6);
    assert_eq!(driver.history()[0].pair_name, "CORN/TNB");
}

#[tokio::test]
async fn test_recency_penalty_rotates_pairs() {
    let exchange = make_twin_exchange();
    let config = make_config(2);
    let mut driver = make_driver(&config, &exchange);
    driver.run(std::future::pending()).await;

    let traded: Vec<i64> = exchange.orders().iter().map(|o| o.asset_pair_id).collect();
    assert_eq!(traded, vec![1, 2]);
}

#[tokio::test]
async fn test_auth_failure_skips_iterations_without_stopping() {
    let exchange = make_twin_exchange();
    exchange.fail_login(true);

    let config = make_config(2);
    let mut driver = make_driver(&config, &exchange);
    let summary = driver.run(std::future::pending()).await;

    assert_eq!(exchange.login_count(), 2);
    assert!(exchange.orders().is_empty());
    assert_eq!(summary.iterations, 2);
    assert_eq!(summary.total_trades, 0);
}

#[tokio::test]
async fn test_order_rejection_is_not_fatal() {
    let exchange = make_twin_exchange();
    exchange.fail_orders(true);

    let config = make_config(2);
    let mut driver = make_driver(&config, &exchange);
    let summary = driver.run(std::future::pending()).await;

    assert_eq!(summary.iterations, 2);
    assert_eq!(summary.total_trades, 0);
    assert!(driver.history().is_empty());
}

#[tokio::test]
async fn test_wallet_failure_keeps_previous_balances() {
    let exchange = make_twin_exchange();
    let config = make_config(1);
    let mut driver = make_driver(&config, &exchange);

    assert_eq!(driver.run_one_iteration(&[]).await.len(), 1);

    exchange.fail_wallets(true);
    exchange.set_wallets(vec![Wallet::new("TNB", 0)]);
    assert_eq!(driver.run_one_iteration(&[]).await.len(), 1);
    assert_eq!(driver.wallets().balance("TNB"), 1000);
}

#[tokio::test]
async fn test_dry_run_submits_nothing() {
    let exchange = make_twin_exchange();
    let mut config = make_config(1);
    config.bot.dry_run = true;

    let mut driver = make_driver(&config, &exchange);
    let summary = driver.run(std::future::pending()).await;

    assert!(exchange.orders().is_empty());
    assert_eq!(summary.total_trades, 1);
}

#[tokio::test]
async fn test_journal_replay_carries_penalty_across_sessions() {
    let path = temp_journal();
    let mut config = make_config(1);
    config.bot.journal_path = Some(path.to_string_lossy().into_owned());

    let first = make_twin_exchange();
    make_driver(&config, &first).run(std::future::pending()).await;
    assert_eq!(first.orders()[0].asset_pair_id, 1);

    let history = TradeJournal::new(&path, &config.bot.name).load_history().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].pair_name, "AAA/TNB");

    let second = make_twin_exchange();
    make_driver(&config, &second)
        .with_history(history)
        .run(std::future::pending())
        .await;
    assert_eq!(second.orders()[0].asset_pair_id, 2);

    assert_eq!(TradeJournal::new(&path, &config.bot.name).load().unwrap().len(), 2);
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_dry_run_journal_does_not_penalise_live_session() {
    let path = temp_journal();
    let mut config = make_config(1);
    config.bot.journal_path = Some(path.to_string_lossy().into_owned());

    config.bot.dry_run = true;
    let rehearsal = make_twin_exchange();
    make_driver(&config, &rehearsal).run(std::future::pending()).await;
    assert!(rehearsal.orders().is_empty());

    let journal = TradeJournal::new(&path, &config.bot.name);
    assert_eq!(journal.load().unwrap().len(), 1);
    let history = journal.load_history().unwrap();
    assert!(history.is_empty());

    config.bot.dry_run = false;
    let live = make_twin_exchange();
    make_driver(&config, &live)
        .with_history(history)
        .run(std::future::pending())
        .await;
    assert_eq!(live.orders()[0].asset_pair_id, 1);
    let _ = std::fs::remove_file(&path);
}
