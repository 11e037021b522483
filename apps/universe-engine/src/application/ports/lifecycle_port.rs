//! Security Lifecycle Port (Driven Port)
//!
//! Receives the lifecycle diffs produced by evaluation cycles and performs
//! the actual subscription and teardown work.

use std::collections::BTreeSet;

use crate::domain::shared::{Symbol, Timestamp};
use crate::domain::universe::UniverseIdentity;

/// Lifecycle dispatch error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    /// The manager refused the change.
    #[error("lifecycle change rejected for {universe}: {message}")]
    Rejected {
        /// Universe the change belonged to.
        universe: String,
        /// Reason.
        message: String,
    },
}

/// Port for security lifecycle management.
///
/// Called synchronously on the evaluation's execution context. For one
/// cycle, `add_securities` is always called before `remove_securities`.
/// Implementations must not call back into the universe service.
#[cfg_attr(test, mockall::automock)]
pub trait SecurityLifecycleManager {
    /// Symbols entering the universe.
    fn add_securities(
        &mut self,
        universe: &UniverseIdentity,
        symbols: &BTreeSet<Symbol>,
        at: Timestamp,
    ) -> Result<(), LifecycleError>;

    /// Symbols leaving the universe.
    fn remove_securities(
        &mut self,
        universe: &UniverseIdentity,
        symbols: &BTreeSet<Symbol>,
        at: Timestamp,
    ) -> Result<(), LifecycleError>;

    /// The universe itself ceases to exist.
    fn remove_universe(
        &mut self,
        universe: &UniverseIdentity,
        at: Timestamp,
    ) -> Result<(), LifecycleError>;
}
