//! Constituent Universe Selection
//!
//! Domain types for deriving a universe from a composite's holdings:
//! identity resolution, record schemas, selection filters, membership
//! diffing and delisting teardown.

mod delisting;
mod engine;
mod errors;
mod evaluation;
mod filter;
mod identity;
mod record;

pub use delisting::{CompositeStatus, DelistingMonitor, DelistingTeardown};
pub use engine::{SelectionSettings, UniverseSelectionEngine};
pub use errors::UniverseError;
pub use evaluation::{
    EvaluationOutcome, MembershipChanges, MembershipSet, SelectionEvaluation, SkipReason,
};
pub use filter::{
    AllConstituents, MinimumWeight, RequireConstituent, Selection, SelectionError,
    SelectionFilter, TopByWeight,
};
pub use identity::{
    CompositeSymbolResolver, UNIVERSE_TAG, UniverseIdentity, is_universe_identifier,
};
pub use record::{ConstituentData, ConstituentRecord, WeightedConstituent};
