//! Trade records
//!
//! A trade is an immutable fact: once produced by the matching core it is
//! never mutated or retracted.

use crate::ids::{OrderId, Pair};
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};

/// A single fill between a resting maker and an incoming taker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Per-book monotonic trade number
    pub sequence: u64,
    pub maker_order_id: OrderId,
    pub taker_order_id: OrderId,
    /// Always the maker's price
    pub price: Price,
    pub amount: Quantity,
    pub pair: Pair,
    pub timestamp: i64, // Unix nanos
}
