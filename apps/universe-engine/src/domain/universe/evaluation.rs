//! Membership state and evaluation results.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::shared::{Symbol, Timestamp};

/// Symbols currently active in a universe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MembershipSet(BTreeSet<Symbol>);

impl MembershipSet {
    /// Empty membership.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Whether `symbol` is a member.
    #[must_use]
    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.0.contains(symbol)
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Members in symbol order.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.0.iter()
    }

    /// Changes that turn `self` into `next`.
    #[must_use]
    pub fn diff(&self, next: &Self) -> MembershipChanges {
        MembershipChanges {
            added: next.0.difference(&self.0).cloned().collect(),
            removed: self.0.difference(&next.0).cloned().collect(),
        }
    }

    /// Apply changes, additions first.
    #[must_use = "method returns the updated membership"]
    pub fn apply(mut self, changes: &MembershipChanges) -> Self {
        self.0.extend(changes.added.iter().cloned());
        for symbol in &changes.removed {
            self.0.remove(symbol);
        }
        self
    }
}

impl FromIterator<Symbol> for MembershipSet {
    fn from_iter<I: IntoIterator<Item = Symbol>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Lifecycle diff produced by one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipChanges {
    /// Symbols entering the universe.
    pub added: BTreeSet<Symbol>,
    /// Symbols leaving the universe.
    pub removed: BTreeSet<Symbol>,
}

impl MembershipChanges {
    /// Check if there are any changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Changes with only removals.
    #[must_use]
    pub fn remove_only(symbols: impl IntoIterator<Item = Symbol>) -> Self {
        Self {
            added: BTreeSet::new(),
            removed: symbols.into_iter().collect(),
        }
    }
}

/// Audit record of one committed evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionEvaluation {
    /// Evaluation time.
    pub as_of: Timestamp,
    /// Composite ticker in effect at `as_of`.
    pub ticker: Symbol,
    /// Number of input records.
    pub record_count: usize,
    /// Symbols present in the input snapshot.
    pub input: BTreeSet<Symbol>,
    /// Membership after the evaluation.
    pub selected: MembershipSet,
    /// Whether the filter asked to keep membership unchanged.
    pub unchanged: bool,
    /// Resulting diff.
    pub changes: MembershipChanges,
}

/// Why an evaluation request did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// `as_of` is not after the last evaluation.
    Stale {
        /// Last committed evaluation time.
        last_evaluated: Timestamp,
    },
    /// The composite has been delisted.
    Delisted {
        /// Delisting time.
        at: Timestamp,
    },
}

/// Result of an evaluation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationOutcome {
    /// The cycle ran and was committed.
    Evaluated(MembershipChanges),
    /// The request was a no-op.
    Skipped(SkipReason),
}

impl EvaluationOutcome {
    /// Changes to forward to the lifecycle manager; empty when skipped.
    #[must_use]
    pub fn changes(&self) -> MembershipChanges {
        match self {
            Self::Evaluated(changes) => changes.clone(),
            Self::Skipped(_) => MembershipChanges::default(),
        }
    }

    /// Whether the cycle ran.
    #[must_use]
    pub const fn is_evaluated(&self) -> bool {
        matches!(self, Self::Evaluated(_))
    }

    /// Metric label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Evaluated(_) => "evaluated",
            Self::Skipped(SkipReason::Stale { .. }) => "stale",
            Self::Skipped(SkipReason::Delisted { .. }) => "delisted",
        }
    }
}
