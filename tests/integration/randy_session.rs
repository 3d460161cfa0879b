//! Randomized-bot sessions through the full driver.

use std::sync::Arc;

use tnb_trader::config::{AppConfig, Credentials};
use tnb_trader::engine::driver::IterationDriver;
use tnb_trader::strategy::build_selector;
use tnb_trader::types::{Action, AssetPair};

use crate::mock_exchange::{make_book, MockExchange};

fn make_config(sell_probability: f64) -> AppConfig {
    AppConfig::from_toml_str(&format!(
        r#"
        [bot]
        name = "randy-it"
        kind = "randy"

        [schedule]
        interval_secs = 0
        max_iterations = 1

        [randy]
        sell_probability = {sell_probability:.1}
        "#
    ))
    .unwrap()
}

fn make_driver(config: &AppConfig, exchange: &MockExchange) -> IterationDriver {
    IterationDriver::new(
        config,
        Arc::new(exchange.clone()),
        build_selector(config),
        Credentials::new("randy", "secret"),
    )
    .unwrap()
}

#[tokio::test]
async fn test_buy_with_empty_book_uses_fallback_order() {
    let exchange = MockExchange::new()
        .with_pair(AssetPair::new(9, "TUNA", "TNB"), make_book(&[], &[]))
        .with_wallet("TNB", 500);

    let config = make_config(0.0);
    let summary = make_driver(&config, &exchange).run(std::future::pending()).await;

    let orders = exchange.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].asset_pair_id, 9);
    assert_eq!((orders[0].price, orders[0].quantity), (4, 20));
    assert_eq!(orders[0].action, Action::Buy);
    assert_eq!(summary.average_score(), 0.0);
}

#[tokio::test]
async fn test_low_balance_places_nothing() {
    let exchange = MockExchange::new()
        .with_pair(AssetPair::new(9, "TUNA", "TNB"), make_book(&[], &[(10, 5)]))
        .with_wallet("TNB", 50);

    let config = make_config(0.0);
    make_driver(&config, &exchange).run(std::future::pending()).await;
    assert!(exchange.orders().is_empty());
}

#[tokio::test]
async fn test_sell_liquidates_part_of_holding() {
    let exchange = MockExchange::new()
        .with_pair(AssetPair::new(1, "BEAN", "TNB"), make_book(&[(5, 1)], &[]))
        .with_pair(AssetPair::new(2, "TUNA", "TNB"), make_book(&[(40, 3)], &[(60, 3)]))
        .with_wallet("TNB", 0)
        .with_wallet("TUNA", 200);

    let config = make_config(1.0);
    make_driver(&config, &exchange).run(std::future::pending()).await;

    let orders = exchange.orders();
    assert_eq!(orders.len(), 1);
    let order = orders[0];
    assert_eq!(order.asset_pair_id, 2);
    assert_eq!(order.action, Action::Sell);
    assert_eq!(order.price, 42);
    assert!(order.quantity >= 50 && order.quantity < 200);
}
