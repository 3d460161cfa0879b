//! Order executor.
//!
//! Submits the selected opportunity to the exchange exactly once. Failures
//! are logged and reported as `None`; nothing is retried here.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::exchange::ExchangeApi;
use crate::types::{OrderReceipt, OrderRequest, TradeOpportunity};

/// An opportunity the exchange accepted (or dry-run pretended to).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutedTrade {
    pub opportunity: TradeOpportunity,
    pub receipt: OrderReceipt,
    pub executed_at: DateTime<Utc>,
}

impl ExecutedTrade {
    pub fn total_value(&self) -> i64 {
        self.opportunity.total_value()
    }
}

pub struct Executor {
    dry_run: bool,
}

impl Executor {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Place one order for `opportunity`.
    ///
    /// Rejects non-positive price or quantity before contacting the exchange.
    pub async fn execute(
        &self,
        api: &dyn ExchangeApi,
        opportunity: &TradeOpportunity,
    ) -> Option<ExecutedTrade> {
        if !opportunity.is_valid() {
            warn!(
                pair = %opportunity.pair_name,
                action = %opportunity.action,
                price = opportunity.price,
                quantity = opportunity.quantity,
                "Invalid order parameters, skipping order placement"
            );
            return None;
        }

        let request = OrderRequest::from_opportunity(opportunity);

        if self.dry_run {
            info!(
                pair = %opportunity.pair_name,
                action = %opportunity.action,
                price = request.price,
                quantity = request.quantity,
                score = format!("{:.1}", opportunity.score),
                "[DRY RUN] Would place order"
            );
            return Some(ExecutedTrade {
                opportunity: opportunity.clone(),
                receipt: OrderReceipt::dry_run(&request),
                executed_at: Utc::now(),
            });
        }

        info!(
            pair = %opportunity.pair_name,
            action = %opportunity.action,
            price = request.price,
            quantity = request.quantity,
            "Placing order"
        );

        match api.place_order(&request).await {
            Ok(receipt) => {
                info!(
                    pair = %opportunity.pair_name,
                    order_id = %receipt.order_id,
                    "Order placed"
                );
                Some(ExecutedTrade {
                    opportunity: opportunity.clone(),
                    receipt,
                    executed_at: Utc::now(),
                })
            }
            Err(e) => {
                error!(
                    pair = %opportunity.pair_name,
                    action = %opportunity.action,
                    error = %e,
                    "Failed to place order"
                );
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// OrderReceipt helpers
// ---------------------------------------------------------------------------

/// Order-id prefix of receipts fabricated in dry-run mode.
pub const DRY_RUN_ORDER_PREFIX: &str = "dry-run-";

impl OrderReceipt {
    /// Receipt for an order that was only logged.
    pub fn dry_run(request: &OrderRequest) -> Self {
        Self {
            order_id: format!("{DRY_RUN_ORDER_PREFIX}{}", uuid::Uuid::new_v4()),
            asset_pair_id: request.asset_pair_id,
            price: request.price,
            quantity: request.quantity,
            side: request.action.side(),
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
