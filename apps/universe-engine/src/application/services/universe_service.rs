//! Universe Service
//!
//! Orchestrates evaluation cycles for any number of independent universes:
//!
//! ```text
//! clock tick ──► ConstituentDataSource::fetch ──► engine.evaluate ──► lifecycle
//!                                                   (filter, diff)      add, then remove
//! ```
//!
//! Every call runs to completion before returning. Universes share nothing
//! but the service that holds them.
//!
//! The engine commits before the lifecycle manager is told. A dispatch the
//! manager rejects is held per universe and re-sent, minus the parts already
//! accepted, at the start of the next call for that universe.

use std::collections::HashMap;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::cadence::EvaluationCadence;
use crate::application::ports::{
    ConstituentDataSource, DataSourceError, LifecycleError, SecurityLifecycleManager,
};
use crate::domain::composite::{CompositeIdentity, MappingError, MappingEvent, SecurityIdentifier};
use crate::domain::shared::{Symbol, Timestamp};
use crate::domain::universe::{
    CompositeSymbolResolver, ConstituentData, DelistingTeardown, EvaluationOutcome,
    MembershipChanges, SelectionFilter, SelectionSettings, UniverseError, UniverseIdentity,
    UniverseSelectionEngine,
};
use crate::infrastructure::metrics;

/// Per-universe evaluation settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationSettings {
    /// How often the caller should evaluate.
    pub cadence: EvaluationCadence,
    /// Minimum records per snapshot (0 = no minimum).
    pub min_constituents: usize,
}

impl EvaluationSettings {
    /// Engine-level subset of the settings.
    #[must_use]
    pub const fn selection(&self) -> SelectionSettings {
        SelectionSettings {
            min_constituents: self.min_constituents,
        }
    }
}

/// Handle to a universe registered with a [`UniverseService`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EngineHandle {
    universe: UniverseIdentity,
}

impl EngineHandle {
    /// Universe this handle refers to.
    #[must_use]
    pub const fn universe(&self) -> &UniverseIdentity {
        &self.universe
    }
}

/// Universe service errors.
#[derive(Debug, Error)]
pub enum UniverseServiceError {
    /// The evaluation itself failed; membership is unchanged.
    #[error(transparent)]
    Evaluation(#[from] UniverseError),

    /// The data source could not supply a snapshot; membership is unchanged.
    #[error("data source {source_name} failed for {composite} at {as_of}: {source}")]
    DataSource {
        /// Data source name.
        source_name: &'static str,
        /// Composite ticker.
        composite: Symbol,
        /// Evaluation time.
        as_of: Timestamp,
        /// Underlying error.
        source: DataSourceError,
    },

    /// The lifecycle manager rejected a committed change.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// A universe already exists for the composite.
    #[error("universe {0} already exists")]
    UniverseExists(UniverseIdentity),

    /// No universe is registered under the given key.
    #[error("no universe registered for {0}")]
    UnknownUniverse(String),

    /// The ticker already routes to a different universe.
    #[error("ticker {ticker} already routes to universe {universe}")]
    TickerConflict {
        /// Contested ticker.
        ticker: Symbol,
        /// Universe the ticker routes to.
        universe: UniverseIdentity,
    },

    /// A rename could not be recorded.
    #[error(transparent)]
    Mapping(#[from] MappingError),
}

/// Committed changes the lifecycle manager has not accepted yet.
#[derive(Debug)]
struct PendingDispatch {
    at: Timestamp,
    changes: MembershipChanges,
    remove_universe: bool,
}

impl PendingDispatch {
    const fn changes(changes: MembershipChanges, at: Timestamp) -> Self {
        Self {
            at,
            changes,
            remove_universe: false,
        }
    }

    fn teardown(teardown: DelistingTeardown) -> Self {
        Self {
            at: teardown.at,
            changes: teardown.changes,
            remove_universe: true,
        }
    }

    /// Forward what is left, additions before removals before the universe
    /// itself. Accepted parts are cleared.
    fn deliver<L: SecurityLifecycleManager>(
        &mut self,
        lifecycle: &mut L,
        universe: &UniverseIdentity,
    ) -> Result<(), LifecycleError> {
        if !self.changes.added.is_empty() {
            lifecycle.add_securities(universe, &self.changes.added, self.at)?;
            self.changes.added.clear();
        }
        if !self.changes.removed.is_empty() {
            lifecycle.remove_securities(universe, &self.changes.removed, self.at)?;
            self.changes.removed.clear();
        }
        if self.remove_universe {
            lifecycle.remove_universe(universe, self.at)?;
            self.remove_universe = false;
        }
        Ok(())
    }
}

struct ManagedUniverse<R> {
    engine: UniverseSelectionEngine<R>,
    settings: EvaluationSettings,
    pending: Option<PendingDispatch>,
}

impl<R: ConstituentData> ManagedUniverse<R> {
    /// Deliver the pending dispatch, keeping whatever is still rejected.
    fn settle<L: SecurityLifecycleManager>(
        &mut self,
        lifecycle: &mut L,
    ) -> Result<(), LifecycleError> {
        let Some(pending) = self.pending.as_mut() else {
            return Ok(());
        };

        if let Err(error) = pending.deliver(lifecycle, self.engine.universe()) {
            warn!(
                universe = %self.engine.universe(),
                at = %pending.at,
                error = %error,
                "Lifecycle dispatch rejected, held for retry"
            );
            return Err(error);
        }

        self.pending = None;
        Ok(())
    }
}

/// Manages constituent universes and their external collaborators.
pub struct UniverseService<R, S, L> {
    resolver: CompositeSymbolResolver,
    universes: HashMap<UniverseIdentity, ManagedUniverse<R>>,
    /// Every ticker a composite has used, mapped to its universe.
    tickers: HashMap<Symbol, UniverseIdentity>,
    identifiers: HashMap<SecurityIdentifier, UniverseIdentity>,
    source: S,
    lifecycle: L,
}

impl<R, S, L> UniverseService<R, S, L>
where
    R: ConstituentData,
    S: ConstituentDataSource<R>,
    L: SecurityLifecycleManager,
{
    /// Create a service around a data source and a lifecycle manager.
    #[must_use]
    pub fn new(source: S, lifecycle: L) -> Self {
        Self {
            resolver: CompositeSymbolResolver::new(),
            universes: HashMap::new(),
            tickers: HashMap::new(),
            identifiers: HashMap::new(),
            source,
            lifecycle,
        }
    }

    /// Register a universe for `composite`.
    ///
    /// Without a filter, every constituent is selected.
    pub fn create_universe(
        &mut self,
        composite: CompositeIdentity,
        settings: EvaluationSettings,
        filter: Option<Box<dyn SelectionFilter<R>>>,
    ) -> Result<(UniverseIdentity, EngineHandle), UniverseServiceError> {
        let universe = self.resolver.resolve(&composite);
        if self.universes.contains_key(&universe) {
            return Err(UniverseServiceError::UniverseExists(universe));
        }

        for ticker in composite.mapping().all_tickers() {
            self.check_route(ticker, &universe)?;
        }
        for ticker in composite.mapping().all_tickers() {
            self.tickers.insert(ticker.clone(), universe.clone());
        }
        self.identifiers
            .insert(composite.identifier().clone(), universe.clone());

        let engine = UniverseSelectionEngine::new(composite, settings.selection(), filter);
        info!(
            universe = %universe,
            composite = %engine.composite(),
            filter = engine.filter_name(),
            cadence = settings.cadence.as_str(),
            min_constituents = settings.min_constituents,
            "Universe created"
        );

        self.universes.insert(
            universe.clone(),
            ManagedUniverse {
                engine,
                settings,
                pending: None,
            },
        );

        Ok((universe.clone(), EngineHandle { universe }))
    }

    /// Fetch the snapshot for `as_of` and run one evaluation cycle.
    ///
    /// Stale and post-delisting requests return early without touching the
    /// data source or the filter. A held dispatch is re-sent first; if it is
    /// rejected again, nothing is evaluated.
    pub fn run_cycle(
        &mut self,
        handle: &EngineHandle,
        as_of: Timestamp,
    ) -> Result<EvaluationOutcome, UniverseServiceError> {
        let managed = self
            .universes
            .get_mut(handle.universe())
            .ok_or_else(|| UniverseServiceError::UnknownUniverse(handle.universe().to_string()))?;
        managed.settle(&mut self.lifecycle)?;
        let engine = &managed.engine;

        if let Some(reason) = engine.skip_reason(as_of) {
            let outcome = EvaluationOutcome::Skipped(reason);
            debug!(universe = %engine.universe(), as_of = %as_of, ?reason, "Evaluation skipped");
            metrics::record_evaluation(outcome.label());
            return Ok(outcome);
        }

        let records = self.source.fetch(engine.composite(), as_of).map_err(|source| {
            warn!(
                universe = %engine.universe(),
                composite = %engine.composite().ticker_at(as_of),
                as_of = %as_of,
                data_source = self.source.name(),
                error = %source,
                "Constituent fetch failed"
            );
            metrics::record_evaluation("fetch_failed");
            UniverseServiceError::DataSource {
                source_name: self.source.name(),
                composite: engine.composite().ticker_at(as_of).clone(),
                as_of,
                source,
            }
        })?;

        evaluate_and_dispatch(managed, &mut self.lifecycle, as_of, &records)
    }

    /// Evaluate externally delivered records, routed by any ticker the
    /// composite has used.
    pub fn evaluate_records(
        &mut self,
        ticker: &Symbol,
        as_of: Timestamp,
        records: &[R],
    ) -> Result<EvaluationOutcome, UniverseServiceError> {
        let universe = self
            .tickers
            .get(ticker)
            .ok_or_else(|| UniverseServiceError::UnknownUniverse(ticker.to_string()))?;
        let managed = self
            .universes
            .get_mut(universe)
            .ok_or_else(|| UniverseServiceError::UnknownUniverse(universe.to_string()))?;
        managed.settle(&mut self.lifecycle)?;

        evaluate_and_dispatch(managed, &mut self.lifecycle, as_of, records)
    }

    /// Record a composite rename and route the new ticker to its universe.
    ///
    /// A ticker that already routes to another universe is rejected.
    pub fn apply_mapping(
        &mut self,
        identifier: &SecurityIdentifier,
        event: MappingEvent,
    ) -> Result<(), UniverseServiceError> {
        let universe = self
            .identifiers
            .get(identifier)
            .cloned()
            .ok_or_else(|| UniverseServiceError::UnknownUniverse(identifier.to_string()))?;
        self.check_route(&event.ticker, &universe)?;
        let managed = self
            .universes
            .get_mut(&universe)
            .ok_or_else(|| UniverseServiceError::UnknownUniverse(universe.to_string()))?;

        managed.engine.record_mapping(event.clone())?;
        info!(
            universe = %universe,
            ticker = %event.ticker,
            effective = %event.effective,
            "Composite renamed"
        );
        self.tickers.insert(event.ticker, universe);

        Ok(())
    }

    /// Signal that `composite` was delisted at `as_of`.
    ///
    /// The first signal removes the remaining members and then the universe
    /// itself. If the lifecycle manager rejects part of that teardown, the
    /// next signal re-sends the rest. Returns `true` once the universe removal
    /// has been delivered and `false` for signals with nothing left to do.
    pub fn notify_delisted(
        &mut self,
        composite: &CompositeIdentity,
        as_of: Timestamp,
    ) -> Result<bool, UniverseServiceError> {
        let universe = self.resolver.resolve(composite);
        let managed = self
            .universes
            .get_mut(&universe)
            .ok_or_else(|| UniverseServiceError::UnknownUniverse(universe.to_string()))?;

        let retrying = managed
            .pending
            .as_ref()
            .is_some_and(|pending| pending.remove_universe);
        managed.settle(&mut self.lifecycle)?;

        if !retrying {
            let Some(teardown) = managed.engine.delist(as_of) else {
                debug!(universe = %universe, as_of = %as_of, "Repeated delisting signal ignored");
                return Ok(false);
            };
            managed.pending = Some(PendingDispatch::teardown(teardown));
            managed.settle(&mut self.lifecycle)?;
        }

        metrics::record_delisting();
        metrics::set_members(&universe, 0);
        info!(
            universe = %universe,
            as_of = %as_of,
            retried = retrying,
            "Composite delisted, universe removed"
        );

        Ok(true)
    }

    fn check_route(
        &self,
        ticker: &Symbol,
        universe: &UniverseIdentity,
    ) -> Result<(), UniverseServiceError> {
        match self.tickers.get(ticker) {
            Some(existing) if existing != universe => {
                warn!(
                    ticker = %ticker,
                    universe = %universe,
                    routed_to = %existing,
                    "Ticker already routes to another universe"
                );
                Err(UniverseServiceError::TickerConflict {
                    ticker: ticker.clone(),
                    universe: existing.clone(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Handle for the universe a ticker routes to.
    #[must_use]
    pub fn handle_for_ticker(&self, ticker: &Symbol) -> Option<EngineHandle> {
        self.tickers.get(ticker).map(|universe| EngineHandle {
            universe: universe.clone(),
        })
    }

    /// Engine behind a handle, for inspection.
    #[must_use]
    pub fn engine(&self, handle: &EngineHandle) -> Option<&UniverseSelectionEngine<R>> {
        self.universes.get(handle.universe()).map(|m| &m.engine)
    }

    /// Whether a universe holds lifecycle changes awaiting re-delivery.
    #[must_use]
    pub fn has_pending_dispatch(&self, handle: &EngineHandle) -> bool {
        self.universes
            .get(handle.universe())
            .is_some_and(|m| m.pending.is_some())
    }

    /// Settings a universe was created with.
    #[must_use]
    pub fn settings(&self, handle: &EngineHandle) -> Option<EvaluationSettings> {
        self.universes.get(handle.universe()).map(|m| m.settings)
    }

    /// Registered universes.
    pub fn universes(&self) -> impl Iterator<Item = &UniverseIdentity> {
        self.universes.keys()
    }

    /// The lifecycle manager.
    #[must_use]
    pub const fn lifecycle(&self) -> &L {
        &self.lifecycle
    }

    /// The data source.
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }
}

fn evaluate_and_dispatch<R: ConstituentData, L: SecurityLifecycleManager>(
    managed: &mut ManagedUniverse<R>,
    lifecycle: &mut L,
    as_of: Timestamp,
    records: &[R],
) -> Result<EvaluationOutcome, UniverseServiceError> {
    let started = Instant::now();
    let engine = &mut managed.engine;

    let outcome = engine.evaluate(as_of, records).map_err(|error| {
        warn!(
            universe = %engine.universe(),
            composite = %engine.composite().ticker_at(as_of),
            as_of = %as_of,
            filter = engine.filter_name(),
            error = %error,
            "Evaluation aborted, membership unchanged"
        );
        metrics::record_evaluation_error(error.kind());
        error
    })?;

    if let EvaluationOutcome::Evaluated(changes) = &outcome {
        managed.pending = Some(PendingDispatch::changes(changes.clone(), as_of));
        managed.settle(lifecycle)?;

        let engine = &managed.engine;
        metrics::record_membership_changes(changes.added.len(), changes.removed.len());
        metrics::set_members(engine.universe(), engine.membership().len());
        info!(
            universe = %engine.universe(),
            as_of = %as_of,
            records = records.len(),
            added = changes.added.len(),
            removed = changes.removed.len(),
            members = engine.membership().len(),
            "Universe evaluated"
        );
    } else {
        debug!(universe = %managed.engine.universe(), as_of = %as_of, "Evaluation skipped");
    }

    metrics::record_evaluation(outcome.label());
    metrics::record_evaluation_duration(started.elapsed());

    Ok(outcome)
}
