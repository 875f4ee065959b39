//! Error types shared across crates
//!
//! Validation failures are the only recoverable errors in the system. They
//! are raised at the submission boundary, before an order can reach a book.

use thiserror::Error;

/// Reasons a submitted order (or one of its fields) is rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid price: {0} (must be greater than zero)")]
    NonPositivePrice(String),

    #[error("Invalid amount: {0} (must be greater than zero)")]
    NonPositiveAmount(String),

    #[error("Price too large: {value} (max {max})")]
    PriceTooLarge { value: String, max: u64 },

    #[error("Amount too large: {value} (max {max})")]
    AmountTooLarge { value: String, max: u64 },

    #[error("Invalid quantity: {0} (must not be negative)")]
    NegativeQuantity(String),

    #[error("Malformed number: {0}")]
    MalformedNumber(String),

    #[error("Invalid pair: {0} (expected BASE/QUOTE)")]
    InvalidPair(String),

    #[error("Unknown instrument: expected {expected}, got {actual}")]
    UnknownPair { expected: String, actual: String },

    #[error("Invalid order identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Missing field: {0}")]
    MissingField(&'static str),
}
