//! Matching logic module
//!
//! Crossing rules and trade generation used by the price-time priority walk

pub mod crossing;
pub mod executor;

pub use crossing::{can_match, incoming_can_match, price_stops};
pub use executor::MatchExecutor;
