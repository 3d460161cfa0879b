//! Sell-side order book report.
//!
//! Walks every asset pair, keeps the markets that have resting asks and
//! renders them as a Markdown document grouped by primary currency.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::exchange::ExchangeApi;
use crate::types::{BookEntry, BotError};

/// Asks listed per market; the rest are summarised in one line.
const MAX_LISTED_ORDERS: usize = 15;

/// One market with at least one live ask.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSells {
    pub asset_pair_id: i64,
    pub pair_name: String,
    pub secondary_ticker: String,
    pub sell_orders: Vec<BookEntry>,
}

/// Markets with asks, keyed and ordered by primary ticker.
pub type SellSideReport = BTreeMap<String, Vec<MarketSells>>;

/// Fetch every order book and group the markets that have asks.
///
/// A failing pair listing aborts the report; a failing order book only
/// drops that market.
pub async fn collect_sell_side(api: &dyn ExchangeApi) -> Result<SellSideReport, BotError> {
    info!("Fetching asset pairs");
    let pairs = api.list_asset_pairs().await?;

    let mut report = SellSideReport::new();
    for pair in &pairs {
        let book = match api.get_order_book(pair.id).await {
            Ok(book) => book,
            Err(e) => {
                error!(pair = %pair, error = %e, "Failed to fetch order book");
                continue;
            }
        };

        let sell_orders: Vec<BookEntry> =
            book.sell_orders.into_iter().filter(BookEntry::is_live).collect();
        if sell_orders.is_empty() {
            continue;
        }

        report
            .entry(pair.primary_ticker.clone())
            .or_default()
            .push(MarketSells {
                asset_pair_id: pair.id,
                pair_name: pair.name(),
                secondary_ticker: pair.secondary_ticker.clone(),
                sell_orders,
            });
    }

    info!(currencies = report.len(), "Sell-side data collected");
    Ok(report)
}

/// `1234567` → `1,234,567`.
fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn render_market(lines: &mut Vec<String>, currency: &str, market: &MarketSells) {
    let secondary = &market.secondary_ticker;
    let mut orders = market.sell_orders.clone();
    orders.sort_by_key(|o| o.price);

    lines.push(format!("#### Market: {}\n", market.pair_name));
    lines.push(format!("**Number of sell orders:** {}\n", orders.len()));
    lines.push(format!("| Amount ({currency}) | Price ({secondary}) | Total ({secondary}) |"));
    lines.push("|------------------:|--------------------:|--------------------:|".to_string());

    let mut total_quantity = 0i64;
    let mut total_value = 0i64;
    for order in orders.iter().take(MAX_LISTED_ORDERS) {
        let value = order.price.saturating_mul(order.quantity);
        total_quantity = total_quantity.saturating_add(order.quantity);
        total_value = total_value.saturating_add(value);
        lines.push(format!(
            "| {} | {} | {} |",
            group_thousands(order.quantity),
            group_thousands(order.price),
            group_thousands(value),
        ));
    }
    if orders.len() > MAX_LISTED_ORDERS {
        lines.push(format!("\n*... and {} more orders*", orders.len() - MAX_LISTED_ORDERS));
    }
    lines.push(String::new());

    lines.push("**Statistics:**".to_string());
    lines.push(format!(
        "- Total quantity available: {} {currency}",
        group_thousands(total_quantity)
    ));
    lines.push(format!("- Total market value: {} {secondary}", group_thousands(total_value)));
    if let (Some(lowest), Some(highest)) = (orders.first(), orders.last()) {
        lines.push(format!(
            "- Price range: {} - {} {secondary}",
            group_thousands(lowest.price),
            group_thousands(highest.price)
        ));
        lines.push(format!("- Lowest ask: {} {secondary}", group_thousands(lowest.price)));
    }
    lines.push(String::new());
}

/// Render the report as Markdown.
pub fn render_markdown(report: &SellSideReport, generated_at: DateTime<Utc>) -> String {
    let mut lines = vec![
        "# Sell Orders Report by Currency".to_string(),
        format!("\n*Generated: {}*\n", generated_at.format("%Y-%m-%d %H:%M:%S")),
    ];

    if report.is_empty() {
        lines.push("No currencies with sell orders found.".to_string());
        return lines.join("\n");
    }

    lines.push("## Table of Contents\n".to_string());
    for currency in report.keys() {
        lines.push(format!("- [{currency}](#{})", currency.to_lowercase()));
    }
    lines.push(String::new());

    let markets: usize = report.values().map(Vec::len).sum();
    lines.push("## Summary\n".to_string());
    lines.push(format!("- **Total currencies with sell orders:** {}", report.len()));
    lines.push(format!("- **Total markets with sell orders:** {markets}"));
    lines.push(String::new());

    lines.push("### Currencies with Active Sell Orders\n".to_string());
    lines.push(report.keys().cloned().collect::<Vec<_>>().join(", "));
    lines.push("\n".to_string());

    lines.push("## Detailed Order Books\n".to_string());
    for (currency, currency_markets) in report {
        lines.push(format!("### {currency}\n"));
        for market in currency_markets {
            render_market(&mut lines, currency, market);
        }
    }

    lines.join("\n")
}

/// Timestamped default file name for a report written at `now`.
pub fn report_file_name(now: DateTime<Utc>) -> String {
    format!("order_book_sell_side_report_{}.md", now.format("%Y%m%d_%H%M%S"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
