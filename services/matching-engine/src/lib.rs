//! Matching Engine Service
//!
//! Price-time priority limit order book for a single instrument.
//!
//! **Layers:**
//! - `book`: per-price FIFO levels, per-side price maps, the order index
//! - `matching`: crossing rules and trade construction
//! - `order_book`: `OrderBook`, the matching algorithm and cancellation
//! - `sequencer`: the single task that owns a book and applies commands in order
//! - `intake`/`events`: validation and stamping of client requests
//!
//! **Key Invariants:**
//! - Best bid is strictly below best ask after every operation
//! - Every resting order is indexed exactly once
//! - Trades execute at the maker's price
//! - Same command sequence in, same trades out

pub mod book;
pub mod config;
pub mod events;
pub mod intake;
pub mod matching;
pub mod order_book;
pub mod sequencer;

pub use config::{ConfigError, EngineConfig};
pub use events::{CancelOutcome, OrderAction, OrderMessage, OrderRequest};
pub use intake::Intake;
pub use order_book::{BookSnapshot, InvariantViolation, OrderBook, SubmitResult};
pub use sequencer::{BookHandle, SequencerError};
