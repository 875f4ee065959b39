//! Market Data Service
//!
//! Consumes the matching engine's trade stream and produces OHLCV candles.
//!
//! # Architecture
//!
//! ```text
//! Engine trade sink
//!        │
//!   ┌────▼─────┐
//!   │ Candles  │  ← dedupes replays, buckets by pair and timeframe
//!   └──────────┘
//! ```

pub mod candles;

pub use candles::{Candle, CandleAggregator, CandleUpdate, Timeframe};
