//! Order types
//!
//! Wire field names (`id`, `pair`, `side`, `type`, `price`, `amount`,
//! `timestamp`) are shared with existing producers and consumers.

use crate::errors::ValidationError;
use crate::ids::{OrderId, Pair};
use crate::numeric::{Price, Quantity, MAX_AMOUNT, MAX_PRICE};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    Buy,
    /// Sell order (ask)
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.write_str("BUY"),
            Side::Sell => f.write_str("SELL"),
        }
    }
}

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    /// Matches up to its price, remainder rests
    #[default]
    Limit,
    /// Matches at any price, remainder is dropped
    Market,
}

/// An order as delivered to the book
///
/// `amount` is the remaining amount: equal to the original amount on
/// arrival, it only decreases as the order is matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub pair: Pair,
    pub side: Side,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub price: Price,
    pub amount: Quantity,
    pub timestamp: i64, // Unix nanos, arrival
}

impl Order {
    /// Create a limit order
    pub fn limit(
        id: OrderId,
        pair: Pair,
        side: Side,
        price: Price,
        amount: Quantity,
        timestamp: i64,
    ) -> Self {
        Self {
            id,
            pair,
            side,
            order_type: OrderType::Limit,
            price,
            amount,
            timestamp,
        }
    }

    /// Create a market order. The price is carried but never checked
    /// during matching.
    pub fn market(
        id: OrderId,
        pair: Pair,
        side: Side,
        price: Price,
        amount: Quantity,
        timestamp: i64,
    ) -> Self {
        Self {
            order_type: OrderType::Market,
            ..Self::limit(id, pair, side, price, amount, timestamp)
        }
    }

    /// Check the numeric bounds an order must meet before it reaches a book
    ///
    /// The amount must be positive, and neither amount nor price may exceed
    /// `MAX_AMOUNT` / `MAX_PRICE`.
    pub fn check_bounds(&self) -> Result<(), ValidationError> {
        if self.amount.is_zero() {
            return Err(ValidationError::NonPositiveAmount(self.amount.to_string()));
        }
        if self.amount.as_decimal() > Decimal::from(MAX_AMOUNT) {
            return Err(ValidationError::AmountTooLarge {
                value: self.amount.to_string(),
                max: MAX_AMOUNT,
            });
        }
        if self.price.as_decimal() > Decimal::from(MAX_PRICE) {
            return Err(ValidationError::PriceTooLarge {
                value: self.price.to_string(),
                max: MAX_PRICE,
            });
        }
        Ok(())
    }

    pub fn is_filled(&self) -> bool {
        self.amount.is_zero()
    }

    /// Reduce the remaining amount by a fill
    ///
    /// # Panics
    /// Panics if the fill would exceed the remaining amount
    pub fn fill(&mut self, amount: Quantity) {
        self.amount = match self.amount.checked_sub(amount) {
            Some(rest) => rest,
            None => panic!("Fill would exceed order amount"),
        };
    }
}
