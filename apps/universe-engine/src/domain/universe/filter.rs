//! Selection Filters
//!
//! A selection filter maps a snapshot of constituent records to the symbols
//! that should be active. Filters see an immutable slice of records and
//! return a [`Selection`]; they have no access to engine state. Failures are
//! returned as [`SelectionError`] and abort only the current cycle.
//!
//! Any closure `Fn(&[R]) -> Result<Selection, SelectionError>` is a filter:
//!
//! ```rust
//! use universe_engine::domain::universe::{ConstituentRecord, Selection, SelectionFilter};
//!
//! let weighted = |records: &[ConstituentRecord]| {
//!     Ok::<_, universe_engine::domain::universe::SelectionError>(Selection::from_records(
//!         records.iter().filter(|r| !r.weight.is_zero()),
//!     ))
//! };
//! let snapshot: Vec<ConstituentRecord> = Vec::new();
//! assert!(weighted.select(snapshot.as_slice()).unwrap().is_empty_selection());
//! ```

use rust_decimal::Decimal;

use super::record::{ConstituentData, WeightedConstituent};
use crate::domain::shared::Symbol;

/// Errors a filter may signal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// A constituent the filter requires is absent from the snapshot.
    #[error("required constituent {symbol} missing from snapshot")]
    MissingConstituent {
        /// Required symbol.
        symbol: Symbol,
    },

    /// A constituent the filter requires has zero weight.
    #[error("required constituent {symbol} has zero weight")]
    ZeroWeight {
        /// Required symbol.
        symbol: Symbol,
    },

    /// A record carries a weight the filter cannot accept.
    #[error("constituent {symbol} has invalid weight {weight}")]
    InvalidWeight {
        /// Offending symbol.
        symbol: Symbol,
        /// Offending weight.
        weight: Decimal,
    },

    /// Snapshot is smaller than the configured minimum.
    #[error("snapshot has {actual} constituents, at least {required} required")]
    InsufficientConstituents {
        /// Configured minimum.
        required: usize,
        /// Records supplied.
        actual: usize,
    },

    /// Free-form validation failure from a user filter.
    #[error("selection rejected: {0}")]
    Rejected(String),
}

/// Output of a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The symbols that should be active. Duplicates collapse; order is irrelevant.
    Symbols(Vec<Symbol>),
    /// Keep the current membership as-is.
    Unchanged,
}

impl Selection {
    /// Select the symbols of the given records.
    pub fn from_records<'a, R>(records: impl IntoIterator<Item = &'a R>) -> Self
    where
        R: ConstituentData + 'a,
    {
        Self::Symbols(records.into_iter().map(|r| r.symbol().clone()).collect())
    }

    /// Whether this selects no symbols at all.
    #[must_use]
    pub fn is_empty_selection(&self) -> bool {
        matches!(self, Self::Symbols(s) if s.is_empty())
    }
}

impl<S: Into<Symbol>> FromIterator<S> for Selection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::Symbols(iter.into_iter().map(Into::into).collect())
    }
}

/// User-pluggable selection over records of type `R`.
pub trait SelectionFilter<R>: Send {
    /// Choose the active symbols from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectionError`] to abort the current evaluation cycle.
    fn select(&self, records: &[R]) -> Result<Selection, SelectionError>;

    /// Name used in logs.
    fn name(&self) -> &'static str {
        "custom"
    }
}

impl<R, F> SelectionFilter<R> for F
where
    F: Fn(&[R]) -> Result<Selection, SelectionError> + Send,
{
    fn select(&self, records: &[R]) -> Result<Selection, SelectionError> {
        self(records)
    }
}

/// Default filter: every record's symbol, unconditionally.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllConstituents;

impl<R: ConstituentData> SelectionFilter<R> for AllConstituents {
    fn select(&self, records: &[R]) -> Result<Selection, SelectionError> {
        Ok(Selection::from_records(records))
    }

    fn name(&self) -> &'static str {
        "all_constituents"
    }
}

/// Gate: fail the cycle unless `symbol` is present with a nonzero weight.
///
/// Selects every constituent when the gate passes.
#[derive(Debug, Clone)]
pub struct RequireConstituent {
    symbol: Symbol,
}

impl RequireConstituent {
    /// Require `symbol` in every snapshot.
    #[must_use]
    pub fn new(symbol: impl Into<Symbol>) -> Self {
        Self {
            symbol: symbol.into(),
        }
    }
}

impl<R: WeightedConstituent> SelectionFilter<R> for RequireConstituent {
    fn select(&self, records: &[R]) -> Result<Selection, SelectionError> {
        let required = records
            .iter()
            .find(|r| r.symbol() == &self.symbol)
            .ok_or_else(|| SelectionError::MissingConstituent {
                symbol: self.symbol.clone(),
            })?;

        if required.weight().is_zero() {
            return Err(SelectionError::ZeroWeight {
                symbol: self.symbol.clone(),
            });
        }

        Ok(Selection::from_records(records))
    }

    fn name(&self) -> &'static str {
        "require_constituent"
    }
}

/// Keep constituents whose weight is at least the threshold.
#[derive(Debug, Clone, Copy)]
pub struct MinimumWeight(pub Decimal);

impl<R: WeightedConstituent> SelectionFilter<R> for MinimumWeight {
    fn select(&self, records: &[R]) -> Result<Selection, SelectionError> {
        if let Some(bad) = records.iter().find(|r| r.weight() < Decimal::ZERO) {
            return Err(SelectionError::InvalidWeight {
                symbol: bad.symbol().clone(),
                weight: bad.weight(),
            });
        }

        Ok(Selection::from_records(
            records.iter().filter(|r| r.weight() >= self.0),
        ))
    }

    fn name(&self) -> &'static str {
        "minimum_weight"
    }
}

/// Keep the `n` heaviest constituents. Ties are broken by symbol.
#[derive(Debug, Clone, Copy)]
pub struct TopByWeight(pub usize);

impl<R: WeightedConstituent> SelectionFilter<R> for TopByWeight {
    fn select(&self, records: &[R]) -> Result<Selection, SelectionError> {
        let mut ranked: Vec<&R> = records.iter().collect();
        ranked.sort_by(|a, b| {
            b.weight()
                .cmp(&a.weight())
                .then_with(|| a.symbol().cmp(b.symbol()))
        });

        Ok(Selection::from_records(ranked.into_iter().take(self.0)))
    }

    fn name(&self) -> &'static str {
        "top_by_weight"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::Timestamp;
    use crate::domain::universe::record::ConstituentRecord;
    use rust_decimal_macros::dec;

    fn record(symbol: &str, weight: Decimal) -> ConstituentRecord {
        ConstituentRecord::new(
            symbol,
            weight,
            Timestamp::parse("2026-01-02T00:00:00Z").unwrap(),
        )
    }

    fn symbols(selection: Selection) -> Vec<String> {
        match selection {
            Selection::Symbols(s) => s.into_iter().map(Symbol::into_inner).collect(),
            Selection::Unchanged => panic!("expected symbols"),
        }
    }

    #[test]
    fn all_constituents_selects_everything() {
        let records = vec![record("AAPL", dec!(0.07)), record("CASH", dec!(0))];
        let selection = AllConstituents.select(&records).unwrap();
        assert_eq!(symbols(selection), vec!["AAPL", "CASH"]);
    }

    #[test]
    fn require_constituent_missing() {
        let records = vec![record("AAPL", dec!(0.07))];
        let err = RequireConstituent::new("GOOG").select(&records).unwrap_err();
        assert_eq!(
            err,
            SelectionError::MissingConstituent {
                symbol: Symbol::new("GOOG")
            }
        );
    }

    #[test]
    fn require_constituent_zero_weight() {
        let records = vec![record("AAPL", dec!(0.07)), record("GOOG", dec!(0))];
        let err = RequireConstituent::new("goog").select(&records).unwrap_err();
        assert!(matches!(err, SelectionError::ZeroWeight { .. }));
    }

    #[test]
    fn require_constituent_passes() {
        let records = vec![record("AAPL", dec!(0.07)), record("GOOG", dec!(0.02))];
        let selection = RequireConstituent::new("GOOG").select(&records).unwrap();
        assert_eq!(symbols(selection).len(), 2);
    }

    #[test]
    fn minimum_weight_filters() {
        let records = vec![
            record("AAPL", dec!(0.07)),
            record("XYZ", dec!(0.0001)),
            record("MSFT", dec!(0.01)),
        ];
        let selection = MinimumWeight(dec!(0.01)).select(&records).unwrap();
        assert_eq!(symbols(selection), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn minimum_weight_rejects_negative_weight() {
        let records = vec![record("AAPL", dec!(-0.01))];
        let err = MinimumWeight(dec!(0)).select(&records).unwrap_err();
        assert!(matches!(err, SelectionError::InvalidWeight { .. }));
    }

    #[test]
    fn top_by_weight_ranks_and_breaks_ties() {
        let records = vec![
            record("MSFT", dec!(0.05)),
            record("AAPL", dec!(0.07)),
            record("AMZN", dec!(0.05)),
            record("XYZ", dec!(0.001)),
        ];
        let selection = TopByWeight(3).select(&records).unwrap();
        assert_eq!(symbols(selection), vec!["AAPL", "AMZN", "MSFT"]);
    }

    #[test]
    fn closures_are_filters() {
        let filter = |records: &[ConstituentRecord]| {
            if records.is_empty() {
                Ok(Selection::Unchanged)
            } else {
                Err(SelectionError::Rejected("not today".to_string()))
            }
        };

        let empty: Vec<ConstituentRecord> = Vec::new();
        let one = vec![record("AAPL", dec!(0.1))];

        assert_eq!(filter.select(empty.as_slice()).unwrap(), Selection::Unchanged);
        assert!(filter.select(one.as_slice()).is_err());
        assert_eq!(SelectionFilter::<ConstituentRecord>::name(&filter), "custom");
    }

    #[test]
    fn selection_from_iterator() {
        let selection: Selection = ["aapl", "msft"].into_iter().collect();
        assert_eq!(symbols(selection), vec!["AAPL", "MSFT"]);
    }
}
