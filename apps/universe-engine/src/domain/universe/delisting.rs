//! Composite delisting state machine.
//!
//! `Active -> Delisted` is one-way. The first delisting signal produces a
//! teardown; later signals are ignored.

use serde::{Deserialize, Serialize};

use super::evaluation::MembershipChanges;
use super::identity::UniverseIdentity;
use crate::domain::shared::Timestamp;

/// Tradability status of a composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompositeStatus {
    /// Composite is listed.
    #[default]
    Active,
    /// Composite was delisted at the given time. Terminal.
    Delisted {
        /// Delisting time.
        at: Timestamp,
    },
}

/// Teardown produced by the first delisting signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelistingTeardown {
    /// The universe that ceases to exist.
    pub universe: UniverseIdentity,
    /// Delisting time.
    pub at: Timestamp,
    /// Final diff: every remaining member removed.
    pub changes: MembershipChanges,
}

/// Tracks whether a composite is still listed.
#[derive(Debug, Clone, Default)]
pub struct DelistingMonitor {
    status: CompositeStatus,
}

impl DelistingMonitor {
    /// New monitor in the `Active` state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            status: CompositeStatus::Active,
        }
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> CompositeStatus {
        self.status
    }

    /// Delisting time, if delisted.
    #[must_use]
    pub const fn delisted_at(&self) -> Option<Timestamp> {
        match self.status {
            CompositeStatus::Active => None,
            CompositeStatus::Delisted { at } => Some(at),
        }
    }

    /// Whether the composite is delisted.
    #[must_use]
    pub const fn is_delisted(&self) -> bool {
        matches!(self.status, CompositeStatus::Delisted { .. })
    }

    /// Record a delisting signal.
    ///
    /// Returns `true` only for the transition out of `Active`.
    pub fn mark_delisted(&mut self, at: Timestamp) -> bool {
        if self.is_delisted() {
            return false;
        }
        self.status = CompositeStatus::Delisted { at };
        true
    }
}
