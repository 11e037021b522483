//! Universe Selection Engine
//!
//! Runs one evaluation cycle at a time for a single universe:
//!
//! ```text
//! records ──► causality / uniqueness checks ──► filter ──► diff ──► commit
//!                        │                        │
//!                        └──── error ─────────────┴──► state untouched
//! ```
//!
//! The engine exclusively owns the membership set and the last evaluation
//! time. Both change together, and only when a cycle succeeds.

use std::collections::BTreeSet;
use std::fmt;

use super::delisting::{CompositeStatus, DelistingMonitor, DelistingTeardown};
use super::errors::UniverseError;
use super::evaluation::{
    EvaluationOutcome, MembershipChanges, MembershipSet, SelectionEvaluation, SkipReason,
};
use super::filter::{AllConstituents, Selection, SelectionError, SelectionFilter};
use super::identity::{CompositeSymbolResolver, UniverseIdentity};
use super::record::{ConstituentData, ConstituentRecord};
use crate::domain::composite::{CompositeIdentity, MappingError, MappingEvent};
use crate::domain::shared::{Symbol, Timestamp};

/// Per-universe selection settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionSettings {
    /// Minimum records a snapshot must carry (0 = no minimum).
    pub min_constituents: usize,
}

/// Selection engine for one constituent universe.
pub struct UniverseSelectionEngine<R = ConstituentRecord> {
    universe: UniverseIdentity,
    composite: CompositeIdentity,
    settings: SelectionSettings,
    filter: Box<dyn SelectionFilter<R>>,
    membership: MembershipSet,
    last_evaluated: Option<Timestamp>,
    last_evaluation: Option<SelectionEvaluation>,
    delisting: DelistingMonitor,
}

impl<R: ConstituentData> UniverseSelectionEngine<R> {
    /// Create an engine for `composite`.
    ///
    /// Without a filter, every constituent is selected.
    #[must_use]
    pub fn new(
        composite: CompositeIdentity,
        settings: SelectionSettings,
        filter: Option<Box<dyn SelectionFilter<R>>>,
    ) -> Self {
        let universe = CompositeSymbolResolver::new().resolve(&composite);
        let filter: Box<dyn SelectionFilter<R>> = match filter {
            Some(filter) => filter,
            None => Box::new(AllConstituents),
        };

        Self {
            universe,
            composite,
            settings,
            filter,
            membership: MembershipSet::new(),
            last_evaluated: None,
            last_evaluation: None,
            delisting: DelistingMonitor::new(),
        }
    }

    /// Universe identity.
    #[must_use]
    pub const fn universe(&self) -> &UniverseIdentity {
        &self.universe
    }

    /// Composite driving this universe.
    #[must_use]
    pub const fn composite(&self) -> &CompositeIdentity {
        &self.composite
    }

    /// Current membership.
    #[must_use]
    pub const fn membership(&self) -> &MembershipSet {
        &self.membership
    }

    /// Time of the last committed evaluation.
    #[must_use]
    pub const fn last_evaluated(&self) -> Option<Timestamp> {
        self.last_evaluated
    }

    /// Audit record of the last committed evaluation.
    #[must_use]
    pub const fn last_evaluation(&self) -> Option<&SelectionEvaluation> {
        self.last_evaluation.as_ref()
    }

    /// Composite status.
    #[must_use]
    pub const fn status(&self) -> CompositeStatus {
        self.delisting.status()
    }

    /// Whether the composite has been delisted.
    #[must_use]
    pub const fn is_delisted(&self) -> bool {
        self.delisting.is_delisted()
    }

    /// Name of the configured filter.
    #[must_use]
    pub fn filter_name(&self) -> &'static str {
        self.filter.name()
    }

    /// Record a composite rename. The universe identity is unaffected.
    ///
    /// # Errors
    ///
    /// Returns an error if the rename predates the latest recorded rename.
    pub fn record_mapping(&mut self, event: MappingEvent) -> Result<(), MappingError> {
        self.composite.record_mapping(event)
    }

    /// Check whether an evaluation at `as_of` would be a no-op.
    ///
    /// Callers use this to avoid fetching data for a cycle that will not run.
    #[must_use]
    pub fn skip_reason(&self, as_of: Timestamp) -> Option<SkipReason> {
        if let Some(at) = self.delisting.delisted_at() {
            return Some(SkipReason::Delisted { at });
        }

        match self.last_evaluated {
            Some(last_evaluated) if as_of <= last_evaluated => {
                Some(SkipReason::Stale { last_evaluated })
            }
            _ => None,
        }
    }

    /// Run one evaluation cycle.
    ///
    /// Stale or post-delisting requests return [`EvaluationOutcome::Skipped`]
    /// without invoking the filter. On error nothing is committed.
    pub fn evaluate(
        &mut self,
        as_of: Timestamp,
        records: &[R],
    ) -> Result<EvaluationOutcome, UniverseError> {
        if let Some(reason) = self.skip_reason(as_of) {
            return Ok(EvaluationOutcome::Skipped(reason));
        }

        let input = self.validate_snapshot(as_of, records)?;
        let ticker = self.composite.ticker_at(as_of).clone();

        if records.len() < self.settings.min_constituents {
            return Err(UniverseError::Selection {
                composite: ticker,
                as_of,
                source: SelectionError::InsufficientConstituents {
                    required: self.settings.min_constituents,
                    actual: records.len(),
                },
            });
        }

        let selection = self
            .filter
            .select(records)
            .map_err(|source| UniverseError::Selection {
                composite: ticker.clone(),
                as_of,
                source,
            })?;

        let (next, unchanged) = match selection {
            Selection::Symbols(symbols) => (symbols.into_iter().collect::<MembershipSet>(), false),
            Selection::Unchanged => (self.membership.clone(), true),
        };

        let changes = self.membership.diff(&next);
        self.commit(SelectionEvaluation {
            as_of,
            ticker,
            record_count: records.len(),
            input,
            selected: next,
            unchanged,
            changes: changes.clone(),
        });

        Ok(EvaluationOutcome::Evaluated(changes))
    }

    /// Handle a delisting signal for the composite.
    ///
    /// The first signal empties the membership and returns the teardown for
    /// the lifecycle manager. Later signals return `None`.
    pub fn delist(&mut self, at: Timestamp) -> Option<DelistingTeardown> {
        if !self.delisting.mark_delisted(at) {
            return None;
        }

        let changes = MembershipChanges::remove_only(self.membership.iter().cloned());
        let as_of = self.last_evaluated.map_or(at, |last| last.max(at));

        self.commit(SelectionEvaluation {
            as_of,
            ticker: self.composite.ticker_at(at).clone(),
            record_count: 0,
            input: BTreeSet::new(),
            selected: MembershipSet::new(),
            unchanged: false,
            changes: changes.clone(),
        });

        Some(DelistingTeardown {
            universe: self.universe.clone(),
            at,
            changes,
        })
    }

    fn validate_snapshot(
        &self,
        as_of: Timestamp,
        records: &[R],
    ) -> Result<BTreeSet<Symbol>, UniverseError> {
        let mut seen = BTreeSet::new();

        for record in records {
            if record.as_of() > as_of {
                return Err(UniverseError::CausalityViolation {
                    symbol: record.symbol().clone(),
                    record_as_of: record.as_of(),
                    as_of,
                });
            }

            if !seen.insert(record.symbol().clone()) {
                return Err(UniverseError::DuplicateConstituent {
                    symbol: record.symbol().clone(),
                    as_of,
                });
            }
        }

        Ok(seen)
    }

    fn commit(&mut self, evaluation: SelectionEvaluation) {
        self.membership = evaluation.selected.clone();
        self.last_evaluated = Some(evaluation.as_of);
        self.last_evaluation = Some(evaluation);
    }
}

impl<R> fmt::Debug for UniverseSelectionEngine<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniverseSelectionEngine")
            .field("universe", &self.universe)
            .field("composite", &self.composite)
            .field("settings", &self.settings)
            .field("members", &self.membership.len())
            .field("last_evaluated", &self.last_evaluated)
            .field("status", &self.delisting.status())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::universe::filter::RequireConstituent;
    use chrono::Duration;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn spy() -> CompositeIdentity {
        CompositeIdentity::us_equity("SPY R735QTJ8XC9X", "SPY")
    }

    fn snapshot(as_of: Timestamp, symbols: &[&str]) -> Vec<ConstituentRecord> {
        symbols
            .iter()
            .map(|s| ConstituentRecord::new(*s, dec!(0.01), as_of))
            .collect()
    }

    fn symbols(set: &BTreeSet<Symbol>) -> Vec<&str> {
        set.iter().map(Symbol::as_str).collect()
    }

    fn engine() -> UniverseSelectionEngine {
        UniverseSelectionEngine::new(spy(), SelectionSettings::default(), None)
    }

    fn engine_with(
        filter: impl SelectionFilter<ConstituentRecord> + 'static,
    ) -> UniverseSelectionEngine {
        UniverseSelectionEngine::new(spy(), SelectionSettings::default(), Some(Box::new(filter)))
    }

    #[test]
    fn first_evaluation_adds_everything() {
        let mut engine = engine();
        let t = ts("2026-01-02T00:00:00Z");

        let outcome = engine
            .evaluate(t, &snapshot(t, &["AAPL", "MSFT"]))
            .unwrap();

        let changes = outcome.changes();
        assert_eq!(symbols(&changes.added), vec!["AAPL", "MSFT"]);
        assert!(changes.removed.is_empty());
        assert_eq!(engine.membership().len(), 2);
        assert_eq!(engine.last_evaluated(), Some(t));
    }

    #[test]
    fn second_evaluation_diffs_against_previous() {
        let mut engine = engine();
        let t1 = ts("2026-01-02T00:00:00Z");
        let t2 = ts("2026-02-02T00:00:00Z");

        engine
            .evaluate(t1, &snapshot(t1, &["AAPL", "MSFT"]))
            .unwrap();
        let changes = engine
            .evaluate(t2, &snapshot(t2, &["MSFT", "NVDA"]))
            .unwrap()
            .changes();

        assert_eq!(symbols(&changes.added), vec!["NVDA"]);
        assert_eq!(symbols(&changes.removed), vec!["AAPL"]);
    }

    #[test]
    fn duplicate_timestamp_is_a_noop() {
        let mut engine = engine();
        let t = ts("2026-01-02T00:00:00Z");

        engine.evaluate(t, &snapshot(t, &["AAPL"])).unwrap();
        let outcome = engine.evaluate(t, &snapshot(t, &["MSFT"])).unwrap();

        assert_eq!(
            outcome,
            EvaluationOutcome::Skipped(SkipReason::Stale { last_evaluated: t })
        );
        assert!(engine.membership().contains(&Symbol::new("AAPL")));
    }

    #[test]
    fn out_of_order_timestamp_is_a_noop() {
        let mut engine = engine();
        let t = ts("2026-01-02T00:00:00Z");
        let earlier = t.shifted(Duration::days(-1));

        engine.evaluate(t, &snapshot(earlier, &["AAPL"])).unwrap();
        let outcome = engine
            .evaluate(earlier, &snapshot(earlier, &["MSFT"]))
            .unwrap();

        assert!(!outcome.is_evaluated());
        assert_eq!(engine.last_evaluated(), Some(t));
    }

    #[test]
    fn future_record_fails_the_cycle() {
        let mut engine = engine();
        let t = ts("2026-01-02T00:00:00Z");
        let mut records = snapshot(t, &["AAPL"]);
        records.push(ConstituentRecord::new(
            "MSFT",
            dec!(0.01),
            t.shifted(Duration::seconds(1)),
        ));

        let err = engine.evaluate(t, &records).unwrap_err();

        assert!(matches!(
            err,
            UniverseError::CausalityViolation { ref symbol, .. } if symbol.as_str() == "MSFT"
        ));
        assert!(engine.membership().is_empty());
        assert_eq!(engine.last_evaluated(), None);
    }

    #[test]
    fn duplicate_symbol_fails_the_cycle() {
        let mut engine = engine();
        let t = ts("2026-01-02T00:00:00Z");

        let err = engine
            .evaluate(t, &snapshot(t, &["AAPL", "aapl"]))
            .unwrap_err();

        assert!(matches!(err, UniverseError::DuplicateConstituent { .. }));
        assert_eq!(engine.last_evaluated(), None);
    }

    #[test]
    fn filter_failure_leaves_state_untouched() {
        let mut engine = engine_with(RequireConstituent::new("GOOG"));
        let t1 = ts("2026-01-02T00:00:00Z");
        let t2 = ts("2026-02-02T00:00:00Z");

        let mut first = snapshot(t1, &["AAPL"]);
        first.push(ConstituentRecord::new("GOOG", dec!(0.02), t1));
        engine.evaluate(t1, &first).unwrap();
        let before = engine.membership().clone();

        let mut second = snapshot(t2, &["AAPL"]);
        second.push(ConstituentRecord::new("GOOG", Decimal::ZERO, t2));
        let err = engine.evaluate(t2, &second).unwrap_err();

        assert!(matches!(
            err,
            UniverseError::Selection {
                source: SelectionError::ZeroWeight { .. },
                ..
            }
        ));
        assert_eq!(err.as_of(), t2);
        assert_eq!(engine.membership(), &before);
        assert_eq!(engine.last_evaluated(), Some(t1));
    }

    #[test]
    fn minimum_constituents_enforced() {
        let mut engine = UniverseSelectionEngine::<ConstituentRecord>::new(
            spy(),
            SelectionSettings {
                min_constituents: 3,
            },
            None,
        );
        let t = ts("2026-01-02T00:00:00Z");

        let err = engine
            .evaluate(t, &snapshot(t, &["AAPL", "MSFT"]))
            .unwrap_err();

        assert!(matches!(
            err,
            UniverseError::Selection {
                source: SelectionError::InsufficientConstituents {
                    required: 3,
                    actual: 2
                },
                ..
            }
        ));
    }

    #[test]
    fn empty_selection_deselects_everything() {
        // Selects everything in January, nothing afterwards.
        let mut engine = engine_with(
            |records: &[ConstituentRecord]| -> Result<Selection, SelectionError> {
                let january = records
                    .first()
                    .is_some_and(|r| r.as_of.year_month() == (2026, 1));
                Ok(if january {
                    Selection::from_records(records)
                } else {
                    Selection::Symbols(Vec::new())
                })
            },
        );
        let t1 = ts("2026-01-02T00:00:00Z");
        let t2 = ts("2026-02-02T00:00:00Z");

        engine
            .evaluate(t1, &snapshot(t1, &["AAPL", "MSFT"]))
            .unwrap();
        let changes = engine
            .evaluate(t2, &snapshot(t2, &["AAPL"]))
            .unwrap()
            .changes();

        assert!(changes.added.is_empty());
        assert_eq!(symbols(&changes.removed), vec!["AAPL", "MSFT"]);
        assert!(engine.membership().is_empty());
        assert_eq!(engine.last_evaluated(), Some(t2));
    }

    #[test]
    fn unchanged_selection_keeps_membership_and_advances_time() {
        let mut engine = engine_with(
            |records: &[ConstituentRecord]| -> Result<Selection, SelectionError> {
                Ok(if records.len() > 1 {
                    Selection::from_records(records)
                } else {
                    Selection::Unchanged
                })
            },
        );
        let t1 = ts("2026-01-02T00:00:00Z");
        let t2 = ts("2026-02-02T00:00:00Z");

        engine
            .evaluate(t1, &snapshot(t1, &["AAPL", "MSFT"]))
            .unwrap();
        let changes = engine
            .evaluate(t2, &snapshot(t2, &["NVDA"]))
            .unwrap()
            .changes();

        assert!(changes.is_empty());
        assert_eq!(engine.membership().len(), 2);
        assert_eq!(engine.last_evaluated(), Some(t2));
        assert!(engine.last_evaluation().unwrap().unchanged);
    }

    #[test]
    fn duplicate_symbols_in_filter_output_collapse() {
        let mut engine = engine_with(
            |_: &[ConstituentRecord]| -> Result<Selection, SelectionError> {
                Ok(["AAPL", "aapl", "MSFT"].into_iter().collect())
            },
        );
        let t = ts("2026-01-02T00:00:00Z");

        let changes = engine.evaluate(t, &snapshot(t, &["AAPL"])).unwrap().changes();
        assert_eq!(symbols(&changes.added), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn delisting_tears_down_once() {
        let mut engine = engine();
        let t = ts("2026-01-02T00:00:00Z");
        let delisted = ts("2026-03-15T00:00:00Z");

        engine
            .evaluate(t, &snapshot(t, &["AAPL", "MSFT"]))
            .unwrap();

        let teardown = engine.delist(delisted).unwrap();
        assert_eq!(&teardown.universe, engine.universe());
        assert_eq!(symbols(&teardown.changes.removed), vec!["AAPL", "MSFT"]);
        assert!(teardown.changes.added.is_empty());
        assert!(engine.membership().is_empty());

        assert!(engine.delist(delisted.shifted(Duration::days(1))).is_none());
    }

    #[test]
    fn evaluation_after_delisting_never_runs_the_filter() {
        let mut engine = engine_with(
            |_: &[ConstituentRecord]| -> Result<Selection, SelectionError> {
                panic!("filter must not run after delisting")
            },
        );
        let delisted = ts("2026-03-15T00:00:00Z");
        assert!(engine.delist(delisted).is_some());

        let later = delisted.shifted(Duration::seconds(1));
        let outcome = engine.evaluate(later, &snapshot(later, &["AAPL"])).unwrap();

        assert_eq!(
            outcome,
            EvaluationOutcome::Skipped(SkipReason::Delisted { at: delisted })
        );
        assert!(engine.is_delisted());
    }

    #[test]
    fn last_evaluation_is_retained() {
        let mut engine = engine();
        let t = ts("2026-01-02T00:00:00Z");

        engine.evaluate(t, &snapshot(t, &["MSFT", "AAPL"])).unwrap();
        let evaluation = engine.last_evaluation().unwrap();

        assert_eq!(evaluation.as_of, t);
        assert_eq!(evaluation.ticker.as_str(), "SPY");
        assert_eq!(evaluation.record_count, 2);
        assert_eq!(evaluation.input.len(), 2);
    }
}
