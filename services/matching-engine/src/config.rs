//! Engine configuration
//!
//! Defaults suit a single BTC/USDT book. Each field can be overridden from
//! the environment:
//!
//! | Variable | Field |
//! |---|---|
//! | `ENGINE_PAIR` | `pair` |
//! | `ENGINE_COMMAND_BUFFER` | `command_buffer` |
//! | `ENGINE_DEDUP_WINDOW` | `dedup_window` |
//! | `ENGINE_SNAPSHOT_DEPTH` | `snapshot_depth` |

use std::str::FromStr;

use thiserror::Error;
use types::errors::ValidationError;
use types::ids::Pair;

pub const ENV_PAIR: &str = "ENGINE_PAIR";
pub const ENV_COMMAND_BUFFER: &str = "ENGINE_COMMAND_BUFFER";
pub const ENV_DEDUP_WINDOW: &str = "ENGINE_DEDUP_WINDOW";
pub const ENV_SNAPSHOT_DEPTH: &str = "ENGINE_SNAPSHOT_DEPTH";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var}: {source}")]
    InvalidPair {
        var: &'static str,
        source: ValidationError,
    },

    #[error("{var}: expected a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

/// Runtime settings for one engine process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Instrument served by this process
    pub pair: Pair,
    /// Capacity of the sequencer's command queue
    pub command_buffer: usize,
    /// Recent fills remembered by the candle aggregator for dedup
    pub dedup_window: usize,
    /// Price levels per side in the final depth summary
    pub snapshot_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pair: Pair::new("BTC/USDT"),
            command_buffer: 1024,
            dedup_window: 10_000,
            snapshot_depth: 10,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by whichever `ENGINE_*` variables are set
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_PAIR) {
            config.pair = Pair::try_new(raw.trim()).map_err(|source| ConfigError::InvalidPair {
                var: ENV_PAIR,
                source,
            })?;
        }
        if let Some(raw) = lookup(ENV_COMMAND_BUFFER) {
            config.command_buffer = parse_positive(ENV_COMMAND_BUFFER, &raw)?;
        }
        if let Some(raw) = lookup(ENV_DEDUP_WINDOW) {
            config.dedup_window = parse_positive(ENV_DEDUP_WINDOW, &raw)?;
        }
        if let Some(raw) = lookup(ENV_SNAPSHOT_DEPTH) {
            config.snapshot_depth = parse_positive(ENV_SNAPSHOT_DEPTH, &raw)?;
        }

        Ok(config)
    }
}

fn parse_positive(var: &'static str, raw: &str) -> Result<usize, ConfigError> {
    match usize::from_str(raw.trim()) {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidNumber {
            var,
            value: raw.to_string(),
        }),
    }
}
