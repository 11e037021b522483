//! In-memory constituent source for testing and replay.

use std::collections::{BTreeMap, HashMap};

use crate::application::ports::{ConstituentDataSource, DataSourceError};
use crate::domain::composite::{CompositeIdentity, SecurityIdentifier};
use crate::domain::shared::Timestamp;

/// In-memory implementation of `ConstituentDataSource`.
///
/// Holds dated snapshots per composite and serves the latest one at or
/// before the requested time.
#[derive(Debug, Clone)]
pub struct InMemoryConstituentSource<R> {
    snapshots: HashMap<SecurityIdentifier, BTreeMap<Timestamp, Vec<R>>>,
}

impl<R> Default for InMemoryConstituentSource<R> {
    fn default() -> Self {
        Self {
            snapshots: HashMap::new(),
        }
    }
}

impl<R> InMemoryConstituentSource<R> {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the snapshot of `composite` published at `as_of`.
    ///
    /// Replaces any snapshot already stored for that time.
    pub fn insert(&mut self, composite: &SecurityIdentifier, as_of: Timestamp, records: Vec<R>) {
        self.snapshots
            .entry(composite.clone())
            .or_default()
            .insert(as_of, records);
    }

    /// Publication times stored for `composite`, ascending.
    pub fn snapshot_times(&self, composite: &SecurityIdentifier) -> Vec<Timestamp> {
        self.snapshots
            .get(composite)
            .map(|by_time| by_time.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Check if the source holds no snapshots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.values().all(BTreeMap::is_empty)
    }
}

impl<R: Clone> ConstituentDataSource<R> for InMemoryConstituentSource<R> {
    fn fetch(
        &self,
        composite: &CompositeIdentity,
        as_of: Timestamp,
    ) -> Result<Vec<R>, DataSourceError> {
        self.snapshots
            .get(composite.identifier())
            .and_then(|by_time| by_time.range(..=as_of).next_back())
            .map(|(_, records)| records.clone())
            .ok_or_else(|| {
                DataSourceError::NoData(format!("{composite} at or before {as_of}"))
            })
    }

    fn name(&self) -> &'static str {
        "InMemory"
    }
}
