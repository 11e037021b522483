#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements,
        clippy::redundant_clone
    )
)]

//! Universe Engine - Constituent-Driven Universe Selection
//!
//! Maintains a dynamic set of instruments derived from the holdings of a
//! composite instrument such as an ETF. On every evaluation the latest
//! constituent snapshot runs through a selection filter, the result is
//! diffed against the previous membership, and the additions and removals
//! are forwarded to a lifecycle manager.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Selection logic with no I/O
//!   - `shared`: `Symbol`, `Timestamp`
//!   - `composite`: composite identity and ticker history
//!   - `universe`: identity, filters, membership diff, engine, delisting
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: constituent data source, security lifecycle manager
//!   - `services`: `UniverseService`, evaluation cadence
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `data_source`: in-memory and JSON snapshot sources
//!   - `lifecycle`: recording and logging lifecycle managers
//!   - `config`, `metrics`, `telemetry`
//!
//! # Data Flow
//!
//! ```text
//! snapshot ──► filter ──► selected set ──► diff vs membership ──► add / remove
//!                │                                                    │
//!                └── error: membership and last-evaluated untouched   ▼
//!                                                          SecurityLifecycleManager
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Selection logic with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::composite::{
    CompositeIdentity, Market, MappingError, MappingEvent, SecurityIdentifier, SecurityType,
};
pub use domain::shared::{Symbol, Timestamp};
pub use domain::universe::{
    AllConstituents, CompositeSymbolResolver, ConstituentData, ConstituentRecord,
    EvaluationOutcome, MembershipChanges, MembershipSet, MinimumWeight, RequireConstituent,
    Selection, SelectionError, SelectionFilter, SelectionSettings, SkipReason, TopByWeight,
    UniverseError, UniverseIdentity, UniverseSelectionEngine, WeightedConstituent,
};

// Ports and services
pub use application::ports::{
    ConstituentDataSource, DataSourceError, LifecycleError, SecurityLifecycleManager,
};
pub use application::services::{
    EngineHandle, EvaluationCadence, EvaluationSettings, UniverseService, UniverseServiceError,
};

// Adapters
pub use infrastructure::config::{ConfigError, EngineConfig};
pub use infrastructure::data_source::{InMemoryConstituentSource, JsonSnapshotSource};
pub use infrastructure::lifecycle::{
    LifecycleEvent, LoggingLifecycleManager, RecordingLifecycleManager,
};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
