//! Constituent records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{Symbol, Timestamp};

/// Minimal capability the selection engine needs from a record schema.
///
/// Any snapshot row that names a symbol and the time it describes can drive
/// a universe.
pub trait ConstituentData {
    /// Constituent symbol.
    fn symbol(&self) -> &Symbol;

    /// Time the record describes.
    fn as_of(&self) -> Timestamp;
}

/// Weight-carrying records, required by the weight-based filters.
pub trait WeightedConstituent: ConstituentData {
    /// Portfolio weight of the constituent (fraction of the composite).
    fn weight(&self) -> Decimal;
}

/// One holding of a composite as of a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstituentRecord {
    /// Constituent symbol.
    pub symbol: Symbol,
    /// Weight in the composite. May be zero.
    pub weight: Decimal,
    /// Snapshot time.
    pub as_of: Timestamp,
    /// Shares held by the composite, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shares_held: Option<Decimal>,
    /// Market value of the holding, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_value: Option<Decimal>,
}

impl ConstituentRecord {
    /// Create a record with symbol, weight and time only.
    #[must_use]
    pub fn new(symbol: impl Into<Symbol>, weight: Decimal, as_of: Timestamp) -> Self {
        Self {
            symbol: symbol.into(),
            weight,
            as_of,
            shares_held: None,
            market_value: None,
        }
    }

    /// Attach holding size details.
    #[must_use = "method returns modified record"]
    pub const fn with_holding(mut self, shares_held: Decimal, market_value: Decimal) -> Self {
        self.shares_held = Some(shares_held);
        self.market_value = Some(market_value);
        self
    }
}

impl ConstituentData for ConstituentRecord {
    fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    fn as_of(&self) -> Timestamp {
        self.as_of
    }
}

impl WeightedConstituent for ConstituentRecord {
    fn weight(&self) -> Decimal {
        self.weight
    }
}
