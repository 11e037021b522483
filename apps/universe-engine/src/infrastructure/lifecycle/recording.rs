//! Recording lifecycle manager for replay and testing.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::application::ports::{LifecycleError, SecurityLifecycleManager};
use crate::domain::shared::{Symbol, Timestamp};
use crate::domain::universe::UniverseIdentity;

/// One lifecycle call, as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// Symbols entered a universe.
    Added {
        /// Universe.
        universe: UniverseIdentity,
        /// Symbols added.
        symbols: BTreeSet<Symbol>,
        /// Evaluation time.
        at: Timestamp,
    },
    /// Symbols left a universe.
    Removed {
        /// Universe.
        universe: UniverseIdentity,
        /// Symbols removed.
        symbols: BTreeSet<Symbol>,
        /// Evaluation time.
        at: Timestamp,
    },
    /// A universe was torn down.
    UniverseRemoved {
        /// Universe.
        universe: UniverseIdentity,
        /// Delisting time.
        at: Timestamp,
    },
}

impl LifecycleEvent {
    /// Universe the event belongs to.
    #[must_use]
    pub const fn universe(&self) -> &UniverseIdentity {
        match self {
            Self::Added { universe, .. }
            | Self::Removed { universe, .. }
            | Self::UniverseRemoved { universe, .. } => universe,
        }
    }

    /// Time the event took effect.
    #[must_use]
    pub const fn at(&self) -> Timestamp {
        match self {
            Self::Added { at, .. }
            | Self::Removed { at, .. }
            | Self::UniverseRemoved { at, .. } => *at,
        }
    }
}

/// Lifecycle manager that keeps every call in order.
///
/// Suitable for backtests and tests. Never rejects a change.
#[derive(Debug, Clone, Default)]
pub struct RecordingLifecycleManager {
    events: Vec<LifecycleEvent>,
}

impl RecordingLifecycleManager {
    /// Create an empty recorder.
    #[must_use]
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Recorded events, oldest first.
    #[must_use]
    pub fn events(&self) -> &[LifecycleEvent] {
        &self.events
    }

    /// Number of teardowns recorded for `universe`.
    #[must_use]
    pub fn removal_count(&self, universe: &UniverseIdentity) -> usize {
        self.events
            .iter()
            .filter(|e| {
                matches!(e, LifecycleEvent::UniverseRemoved { .. }) && e.universe() == universe
            })
            .count()
    }

    /// Drain the recorded events.
    pub fn take_events(&mut self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut self.events)
    }
}

impl SecurityLifecycleManager for RecordingLifecycleManager {
    fn add_securities(
        &mut self,
        universe: &UniverseIdentity,
        symbols: &BTreeSet<Symbol>,
        at: Timestamp,
    ) -> Result<(), LifecycleError> {
        self.events.push(LifecycleEvent::Added {
            universe: universe.clone(),
            symbols: symbols.clone(),
            at,
        });
        Ok(())
    }

    fn remove_securities(
        &mut self,
        universe: &UniverseIdentity,
        symbols: &BTreeSet<Symbol>,
        at: Timestamp,
    ) -> Result<(), LifecycleError> {
        self.events.push(LifecycleEvent::Removed {
            universe: universe.clone(),
            symbols: symbols.clone(),
            at,
        });
        Ok(())
    }

    fn remove_universe(
        &mut self,
        universe: &UniverseIdentity,
        at: Timestamp,
    ) -> Result<(), LifecycleError> {
        self.events.push(LifecycleEvent::UniverseRemoved {
            universe: universe.clone(),
            at,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::composite::CompositeIdentity;
    use crate::domain::universe::CompositeSymbolResolver;

    fn universe() -> UniverseIdentity {
        let spy = CompositeIdentity::us_equity("SPY R735QTJ8XC9X", "SPY");
        CompositeSymbolResolver::new().resolve(&spy)
    }

    #[test]
    fn records_calls_in_order() {
        let at = Timestamp::from_ymd(2026, 1, 2).unwrap();
        let symbols: BTreeSet<Symbol> = [Symbol::new("AAPL")].into_iter().collect();
        let mut manager = RecordingLifecycleManager::new();

        manager.add_securities(&universe(), &symbols, at).unwrap();
        manager.remove_securities(&universe(), &symbols, at).unwrap();
        manager.remove_universe(&universe(), at).unwrap();

        assert!(matches!(manager.events()[0], LifecycleEvent::Added { .. }));
        assert!(matches!(manager.events()[1], LifecycleEvent::Removed { .. }));
        assert!(matches!(manager.events()[2], LifecycleEvent::UniverseRemoved { .. }));
        assert_eq!(manager.removal_count(&universe()), 1);
        assert!(manager.events().iter().all(|e| e.at() == at));
    }

    #[test]
    fn take_events_drains() {
        let mut manager = RecordingLifecycleManager::new();
        manager
            .remove_universe(&universe(), Timestamp::from_ymd(2026, 1, 2).unwrap())
            .unwrap();

        assert_eq!(manager.take_events().len(), 1);
        assert!(manager.events().is_empty());
    }

    #[test]
    fn events_serialize_with_tag() {
        let event = LifecycleEvent::UniverseRemoved {
            universe: universe(),
            at: Timestamp::from_ymd(2026, 1, 2).unwrap(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "universe_removed");
    }
}
