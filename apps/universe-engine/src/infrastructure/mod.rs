//! Infrastructure Layer
//!
//! Adapters behind the application ports, plus configuration and
//! observability.
//!
//! - `data_source`: in-memory and JSON snapshot constituent sources
//! - `lifecycle`: recording and logging lifecycle managers
//! - `config`: environment configuration
//! - `metrics`: Prometheus metrics
//! - `telemetry`: tracing subscriber and OTLP export

pub mod config;
pub mod data_source;
pub mod lifecycle;
pub mod metrics;
pub mod telemetry;
