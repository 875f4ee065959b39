//! Trade execution logic
//!
//! Builds trade records for fills and numbers them

use types::ids::{OrderId, Pair};
use types::numeric::{Price, Quantity};
use types::trade::Trade;

/// Match executor for handling trade generation
#[derive(Debug, Clone)]
pub struct MatchExecutor {
    sequence_counter: u64,
}

impl MatchExecutor {
    /// Create a new match executor with starting sequence number
    pub fn new(starting_sequence: u64) -> Self {
        Self {
            sequence_counter: starting_sequence,
        }
    }

    /// Get next sequence number (monotonically increasing)
    fn next_sequence(&mut self) -> u64 {
        let seq = self.sequence_counter;
        self.sequence_counter += 1;
        seq
    }

    /// Sequence number the next trade will carry
    pub fn peek_sequence(&self) -> u64 {
        self.sequence_counter
    }

    /// Execute a trade between maker and taker orders
    ///
    /// `price` must be the maker's price.
    pub fn execute_trade(
        &mut self,
        pair: &Pair,
        maker_order_id: &OrderId,
        taker_order_id: &OrderId,
        price: Price,
        amount: Quantity,
        timestamp: i64,
    ) -> Trade {
        assert!(!amount.is_zero(), "zero-amount trade");

        Trade {
            sequence: self.next_sequence(),
            maker_order_id: maker_order_id.clone(),
            taker_order_id: taker_order_id.clone(),
            price,
            amount,
            pair: pair.clone(),
            timestamp,
        }
    }
}

impl Default for MatchExecutor {
    fn default() -> Self {
        Self::new(1)
    }
}
