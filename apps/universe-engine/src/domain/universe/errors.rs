//! Evaluation errors.
//!
//! Every variant aborts the current cycle only. Membership and the last
//! evaluation time are left exactly as they were before the call.

use thiserror::Error;

use super::filter::SelectionError;
use crate::domain::shared::{Symbol, Timestamp};

/// Errors raised by [`UniverseSelectionEngine::evaluate`](super::UniverseSelectionEngine::evaluate).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UniverseError {
    /// The selection filter rejected the snapshot.
    #[error("selection failed for {composite} at {as_of}: {source}")]
    Selection {
        /// Composite ticker in effect at `as_of`.
        composite: Symbol,
        /// Evaluation time.
        as_of: Timestamp,
        /// Filter failure.
        source: SelectionError,
    },

    /// A record is dated after the evaluation time.
    #[error(
        "FUTURE_DATA: record for {symbol} dated {record_as_of} supplied to evaluation at {as_of}"
    )]
    CausalityViolation {
        /// Offending record symbol.
        symbol: Symbol,
        /// Record timestamp.
        record_as_of: Timestamp,
        /// Evaluation time.
        as_of: Timestamp,
    },

    /// The snapshot carries more than one record for a symbol.
    #[error("snapshot at {as_of} contains {symbol} more than once")]
    DuplicateConstituent {
        /// Duplicated symbol.
        symbol: Symbol,
        /// Evaluation time.
        as_of: Timestamp,
    },
}

impl UniverseError {
    /// Evaluation time the error is tagged with.
    #[must_use]
    pub const fn as_of(&self) -> Timestamp {
        match self {
            Self::Selection { as_of, .. }
            | Self::CausalityViolation { as_of, .. }
            | Self::DuplicateConstituent { as_of, .. } => *as_of,
        }
    }

    /// Metric label.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Selection { .. } => "selection",
            Self::CausalityViolation { .. } => "causality",
            Self::DuplicateConstituent { .. } => "duplicate",
        }
    }
}
