//! Crossing detection logic
//!
//! Determines when an incoming order can trade against a resting one

use types::numeric::Price;
use types::order::{OrderType, Side};

/// Check if a bid and ask can match at given prices
///
/// For a buy order to match with a sell order the buy price must be >= the
/// sell price.
pub fn can_match(bid_price: Price, ask_price: Price) -> bool {
    bid_price >= ask_price
}

/// Check if an incoming limit order crosses a resting order's price
pub fn incoming_can_match(incoming_side: Side, incoming_price: Price, resting_price: Price) -> bool {
    match incoming_side {
        Side::Buy => can_match(incoming_price, resting_price),
        Side::Sell => can_match(resting_price, incoming_price),
    }
}

/// Whether matching should stop at `resting_price` for this incoming order
///
/// Market orders never stop on price.
pub fn price_stops(
    order_type: OrderType,
    incoming_side: Side,
    incoming_price: Price,
    resting_price: Price,
) -> bool {
    match order_type {
        OrderType::Limit => !incoming_can_match(incoming_side, incoming_price, resting_price),
        OrderType::Market => false,
    }
}
