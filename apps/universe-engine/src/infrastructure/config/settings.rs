//! Engine Configuration Settings
//!
//! Configuration for the universe engine, loaded from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `UNIVERSE_SNAPSHOT_PATH` | required |
//! | `UNIVERSE_CADENCE` | `monthly` |
//! | `UNIVERSE_MIN_CONSTITUENTS` | `0` |
//! | `UNIVERSE_REQUIRED_SYMBOL` | unset |
//! | `UNIVERSE_START` / `UNIVERSE_END` | snapshot file bounds |

use std::path::PathBuf;

use crate::application::services::{EvaluationCadence, EvaluationSettings};
use crate::domain::shared::{Symbol, SymbolError, Timestamp};

/// Complete engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// JSON snapshot file backing the data source.
    pub snapshot_path: PathBuf,
    /// Per-universe evaluation settings.
    pub evaluation: EvaluationSettings,
    /// Symbol every selection must contain, if any.
    pub required_symbol: Option<Symbol>,
    /// First evaluation time (inclusive).
    pub start: Option<Timestamp>,
    /// End of the evaluation window (exclusive).
    pub end: Option<Timestamp>,
}

impl EngineConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `UNIVERSE_SNAPSHOT_PATH` is missing or a set
    /// value cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let snapshot_path = lookup("UNIVERSE_SNAPSHOT_PATH")
            .ok_or_else(|| ConfigError::MissingEnvVar("UNIVERSE_SNAPSHOT_PATH".to_string()))?;
        if snapshot_path.trim().is_empty() {
            return Err(ConfigError::EmptyValue("UNIVERSE_SNAPSHOT_PATH".to_string()));
        }

        let cadence = lookup("UNIVERSE_CADENCE")
            .map(|s| EvaluationCadence::from_str_case_insensitive(&s))
            .unwrap_or_default();

        let min_constituents = parse_usize(
            lookup("UNIVERSE_MIN_CONSTITUENTS"),
            EvaluationSettings::default().min_constituents,
        );

        let required_symbol = match lookup("UNIVERSE_REQUIRED_SYMBOL") {
            Some(raw) if !raw.trim().is_empty() => {
                let symbol = Symbol::new(raw);
                symbol
                    .validate()
                    .map_err(|source| ConfigError::InvalidSymbol {
                        key: "UNIVERSE_REQUIRED_SYMBOL".to_string(),
                        source,
                    })?;
                Some(symbol)
            }
            _ => None,
        };

        let start = parse_timestamp("UNIVERSE_START", lookup("UNIVERSE_START"))?;
        let end = parse_timestamp("UNIVERSE_END", lookup("UNIVERSE_END"))?;

        Ok(Self {
            snapshot_path: PathBuf::from(snapshot_path),
            evaluation: EvaluationSettings {
                cadence,
                min_constituents,
            },
            required_symbol,
            start,
            end,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// Environment variable is not an RFC 3339 timestamp.
    #[error("environment variable {key} is not an RFC 3339 timestamp: {value}")]
    InvalidTimestamp {
        /// Variable name.
        key: String,
        /// Raw value.
        value: String,
    },
    /// Environment variable is not a valid symbol.
    #[error("environment variable {key} is not a valid symbol: {source}")]
    InvalidSymbol {
        /// Variable name.
        key: String,
        /// Validation failure.
        source: SymbolError,
    },
}

fn parse_usize(value: Option<String>, default: usize) -> usize {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn parse_timestamp(key: &str, value: Option<String>) -> Result<Option<Timestamp>, ConfigError> {
    match value {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => Timestamp::parse(raw.trim())
            .map(Some)
            .map_err(|_| ConfigError::InvalidTimestamp {
                key: key.to_string(),
                value: raw,
            }),
    }
}
