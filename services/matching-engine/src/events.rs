//! Wire messages carried by the ingestion transport
//!
//! An `OrderMessage` wraps a raw client request with the action to take.
//! Field names match the JSON schema already used by producers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::ids::OrderId;
use types::numeric::Quantity;
use types::order::{OrderType, Side};

/// What the message asks the book to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderAction {
    New,
    Cancel,
}

/// Ingestion envelope: `{"action": "new" | "cancel", "order": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderMessage {
    pub action: OrderAction,
    pub order: OrderRequest,
}

/// Raw, unvalidated order fields as submitted by a client
///
/// Numbers are kept as plain decimals so that zero and negative values
/// reach validation instead of failing to parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub pair: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub order_type: Option<OrderType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    /// Ignored on intake; the boundary stamps its own arrival time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// Reply to a cancel request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancelOutcome {
    /// Order removed; `remaining` is the amount that will never trade
    Canceled { order_id: OrderId, remaining: Quantity },
    /// Not resting: unknown, already filled or already canceled
    NotFound { order_id: OrderId },
}
