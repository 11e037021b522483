//! Prometheus Metrics Module
//!
//! Records evaluation-cycle metrics through the `metrics` facade.
//!
//! # Metrics Categories
//!
//! - **Evaluations**: Cycles by outcome (evaluated, stale, delisted, fetch_failed)
//! - **Errors**: Aborted cycles by error kind
//! - **Membership**: Current member count and add/remove volume
//! - **Lifecycle**: Delisting teardowns
//! - **Latency**: Evaluation duration
//!
//! Recording functions are no-ops until [`init_metrics`] installs a recorder.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::domain::universe::UniverseIdentity;

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus metrics recorder.
///
/// Repeated calls return the handle installed by the first call.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();

    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "universe_engine_evaluations_total",
        "Evaluation cycles by outcome"
    );
    describe_counter!(
        "universe_engine_selection_errors_total",
        "Evaluation cycles aborted by an error, by kind"
    );

    describe_gauge!(
        "universe_engine_members",
        "Current number of symbols in each universe"
    );
    describe_counter!(
        "universe_engine_membership_changes_total",
        "Symbols added to or removed from universes"
    );

    describe_counter!(
        "universe_engine_delistings_total",
        "Universes torn down after their composite was delisted"
    );

    describe_histogram!(
        "universe_engine_evaluation_seconds",
        "Time to filter, diff and dispatch one evaluation cycle"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Metric labels for membership change direction.
#[derive(Debug, Clone, Copy)]
pub enum ChangeKind {
    /// Symbol entered the universe.
    Added,
    /// Symbol left the universe.
    Removed,
}

impl ChangeKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
        }
    }
}

/// Record a completed or skipped evaluation cycle.
pub fn record_evaluation(outcome: &'static str) {
    counter!("universe_engine_evaluations_total", "outcome" => outcome).increment(1);
}

/// Record an aborted evaluation cycle.
pub fn record_evaluation_error(kind: &'static str) {
    counter!("universe_engine_selection_errors_total", "kind" => kind).increment(1);
}

/// Record the add/remove volume of one cycle.
pub fn record_membership_changes(added: usize, removed: usize) {
    for (kind, count) in [(ChangeKind::Added, added), (ChangeKind::Removed, removed)] {
        if count > 0 {
            counter!(
                "universe_engine_membership_changes_total",
                "kind" => kind.as_str()
            )
            .increment(count as u64);
        }
    }
}

/// Update the member count of a universe.
#[allow(clippy::cast_precision_loss)]
pub fn set_members(universe: &UniverseIdentity, count: usize) {
    gauge!(
        "universe_engine_members",
        "universe" => universe.to_string()
    )
    .set(count as f64);
}

/// Record a delisting teardown.
pub fn record_delisting() {
    counter!("universe_engine_delistings_total").increment(1);
}

/// Record evaluation duration.
pub fn record_evaluation_duration(duration: Duration) {
    histogram!("universe_engine_evaluation_seconds").record(duration.as_secs_f64());
}

// =============================================================================
// Tests
// =============================================================================
