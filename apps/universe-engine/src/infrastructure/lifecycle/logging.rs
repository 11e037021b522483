//! Lifecycle manager that reports changes through `tracing`.

use std::collections::BTreeSet;

use tracing::info;

use crate::application::ports::{LifecycleError, SecurityLifecycleManager};
use crate::domain::shared::{Symbol, Timestamp};
use crate::domain::universe::UniverseIdentity;

/// Logs every lifecycle change and wraps another manager.
#[derive(Debug, Clone, Default)]
pub struct LoggingLifecycleManager<L> {
    inner: L,
}

impl<L> LoggingLifecycleManager<L> {
    /// Wrap `inner`.
    #[must_use]
    pub const fn new(inner: L) -> Self {
        Self { inner }
    }

    /// Wrapped manager.
    #[must_use]
    pub const fn inner(&self) -> &L {
        &self.inner
    }
}

fn joined(symbols: &BTreeSet<Symbol>) -> String {
    symbols
        .iter()
        .map(Symbol::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

impl<L: SecurityLifecycleManager> SecurityLifecycleManager for LoggingLifecycleManager<L> {
    fn add_securities(
        &mut self,
        universe: &UniverseIdentity,
        symbols: &BTreeSet<Symbol>,
        at: Timestamp,
    ) -> Result<(), LifecycleError> {
        info!(
            universe = %universe,
            at = %at,
            count = symbols.len(),
            symbols = %joined(symbols),
            "Securities added"
        );
        self.inner.add_securities(universe, symbols, at)
    }

    fn remove_securities(
        &mut self,
        universe: &UniverseIdentity,
        symbols: &BTreeSet<Symbol>,
        at: Timestamp,
    ) -> Result<(), LifecycleError> {
        info!(
            universe = %universe,
            at = %at,
            count = symbols.len(),
            symbols = %joined(symbols),
            "Securities removed"
        );
        self.inner.remove_securities(universe, symbols, at)
    }

    fn remove_universe(
        &mut self,
        universe: &UniverseIdentity,
        at: Timestamp,
    ) -> Result<(), LifecycleError> {
        info!(universe = %universe, at = %at, "Universe removed");
        self.inner.remove_universe(universe, at)
    }
}
