//! Configuration Module
//!
//! Configuration loading for the universe engine binary.

mod settings;

pub use settings::{ConfigError, EngineConfig};
