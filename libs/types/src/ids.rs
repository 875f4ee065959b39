//! Identifier types
//!
//! Order ids are opaque tokens. The submission boundary either accepts a
//! client-supplied token or generates a UUID v7, which sorts by creation time.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::errors::ValidationError;

/// Longest order id accepted at the boundary, in bytes
pub const MAX_ORDER_ID_LEN: usize = 64;

/// Unique identifier for an order
///
/// Immutable once assigned. The core never inspects its contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Wrap an existing token without validation
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh time-sortable identifier
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Wrap a client-supplied token, rejecting empty, oversized or
    /// whitespace-containing ids
    pub fn try_new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let s = id.into();
        if s.is_empty() || s.len() > MAX_ORDER_ID_LEN || s.chars().any(char::is_whitespace) {
            return Err(ValidationError::InvalidIdentifier(s));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Instrument pair
///
/// Format: "BASE/QUOTE" (e.g., "BTC/USDT", "ETH/USDC")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pair(String);

impl Pair {
    /// Create a new Pair from a string
    ///
    /// # Panics
    /// Panics if the format is invalid (must be BASE/QUOTE)
    pub fn new(symbol: impl Into<String>) -> Self {
        match Self::try_new(symbol) {
            Ok(pair) => pair,
            Err(_) => panic!("Pair must be in BASE/QUOTE format"),
        }
    }

    /// Try to create a Pair, rejecting anything but two non-empty
    /// assets separated by a single '/'
    pub fn try_new(symbol: impl Into<String>) -> Result<Self, ValidationError> {
        let s = symbol.into();
        let valid = match s.split_once('/') {
            Some((base, quote)) => {
                !base.is_empty()
                    && !quote.is_empty()
                    && !quote.contains('/')
                    && !s.chars().any(char::is_whitespace)
            }
            None => false,
        };
        if valid {
            Ok(Self(s))
        } else {
            Err(ValidationError::InvalidPair(s))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into base and quote assets
    pub fn split(&self) -> (&str, &str) {
        // try_new guarantees exactly one separator
        self.0.split_once('/').unwrap_or((self.0.as_str(), ""))
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Pair {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::try_new(s)
    }
}

impl From<Pair> for String {
    fn from(pair: Pair) -> Self {
        pair.0
    }
}
