//! Ticker rename history for a composite.

use serde::{Deserialize, Serialize};

use crate::domain::shared::{Symbol, Timestamp};

/// A ticker change taking effect at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEvent {
    /// When the new ticker takes effect.
    pub effective: Timestamp,
    /// The new ticker.
    pub ticker: Symbol,
}

impl MappingEvent {
    /// Create a mapping event.
    #[must_use]
    pub fn new(effective: Timestamp, ticker: impl Into<Symbol>) -> Self {
        Self {
            effective,
            ticker: ticker.into(),
        }
    }
}

/// Errors raised while recording a rename.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
    /// The rename is dated before the latest recorded rename.
    #[error("mapping to {ticker} at {effective} precedes latest mapping at {latest}")]
    OutOfOrder {
        /// Ticker of the rejected event.
        ticker: Symbol,
        /// Effective time of the rejected event.
        effective: Timestamp,
        /// Effective time of the latest recorded event.
        latest: Timestamp,
    },
}

/// Ordered ticker history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingHistory {
    original: Symbol,
    events: Vec<MappingEvent>,
}

impl MappingHistory {
    /// Start a history with the original ticker.
    #[must_use]
    pub const fn new(original: Symbol) -> Self {
        Self {
            original,
            events: Vec::new(),
        }
    }

    /// Append a rename. Renames must arrive in time order.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::OutOfOrder`] if `event` predates the latest rename.
    pub fn record(&mut self, event: MappingEvent) -> Result<(), MappingError> {
        if let Some(latest) = self.events.last()
            && event.effective < latest.effective
        {
            return Err(MappingError::OutOfOrder {
                ticker: event.ticker,
                effective: event.effective,
                latest: latest.effective,
            });
        }

        self.events.push(event);
        Ok(())
    }

    /// Ticker in effect at `at`.
    #[must_use]
    pub fn ticker_at(&self, at: Timestamp) -> &Symbol {
        self.events
            .iter()
            .rev()
            .find(|e| e.effective <= at)
            .map_or(&self.original, |e| &e.ticker)
    }

    /// Latest ticker regardless of time.
    #[must_use]
    pub fn latest(&self) -> &Symbol {
        self.events.last().map_or(&self.original, |e| &e.ticker)
    }

    /// Every ticker this composite has used, oldest first.
    pub fn all_tickers(&self) -> impl Iterator<Item = &Symbol> {
        std::iter::once(&self.original).chain(self.events.iter().map(|e| &e.ticker))
    }

    /// Recorded renames.
    #[must_use]
    pub fn events(&self) -> &[MappingEvent] {
        &self.events
    }
}
