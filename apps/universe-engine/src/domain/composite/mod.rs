//! Composite Instruments
//!
//! The composite is the instrument whose holdings drive a universe
//! (typically an ETF). Its permanent identifier never changes; its ticker
//! may be renamed over time through mapping events.

mod mapping;

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::shared::{Symbol, Timestamp};

pub use mapping::{MappingError, MappingEvent, MappingHistory};

/// Permanent identifier of an instrument, stable across ticker renames.
///
/// Example: `"SPY R735QTJ8XC9X"`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecurityIdentifier(String);

impl SecurityIdentifier {
    /// Create a new identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecurityIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Instrument type of a composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityType {
    /// Listed equity or ETF.
    Equity,
    /// Index (non-tradable reference).
    Index,
    /// Mutual fund.
    MutualFund,
}

impl SecurityType {
    /// Get the type name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Equity => "equity",
            Self::Index => "index",
            Self::MutualFund => "mutual_fund",
        }
    }
}

impl fmt::Display for SecurityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Market a composite trades in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Market(String);

impl Market {
    /// Create a market code, normalized to lowercase.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().to_lowercase())
    }

    /// US equity market.
    #[must_use]
    pub fn usa() -> Self {
        Self::new("usa")
    }

    /// Get the market code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The instrument whose holdings drive a universe.
///
/// Equality and hashing consider only the permanent identifier, security
/// type and market. The ticker history is carried along but does not change
/// who the composite is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeIdentity {
    identifier: SecurityIdentifier,
    security_type: SecurityType,
    market: Market,
    mapping: MappingHistory,
}

impl CompositeIdentity {
    /// Create a composite listed under `ticker` from the start of its history.
    #[must_use]
    pub fn new(
        identifier: SecurityIdentifier,
        ticker: impl Into<Symbol>,
        security_type: SecurityType,
        market: Market,
    ) -> Self {
        Self {
            identifier,
            security_type,
            market,
            mapping: MappingHistory::new(ticker.into()),
        }
    }

    /// Convenience constructor for a US-listed equity composite.
    #[must_use]
    pub fn us_equity(identifier: &str, ticker: &str) -> Self {
        Self::new(
            SecurityIdentifier::new(identifier),
            ticker,
            SecurityType::Equity,
            Market::usa(),
        )
    }

    /// Permanent identifier.
    #[must_use]
    pub const fn identifier(&self) -> &SecurityIdentifier {
        &self.identifier
    }

    /// Instrument type.
    #[must_use]
    pub const fn security_type(&self) -> SecurityType {
        self.security_type
    }

    /// Market.
    #[must_use]
    pub const fn market(&self) -> &Market {
        &self.market
    }

    /// Ticker history.
    #[must_use]
    pub const fn mapping(&self) -> &MappingHistory {
        &self.mapping
    }

    /// Ticker in effect at `at`.
    #[must_use]
    pub fn ticker_at(&self, at: Timestamp) -> &Symbol {
        self.mapping.ticker_at(at)
    }

    /// Most recent ticker.
    #[must_use]
    pub fn current_ticker(&self) -> &Symbol {
        self.mapping.latest()
    }

    /// Record a rename.
    ///
    /// # Errors
    ///
    /// Returns an error if the event predates the latest recorded rename.
    pub fn record_mapping(&mut self, event: MappingEvent) -> Result<(), MappingError> {
        self.mapping.record(event)
    }
}

impl PartialEq for CompositeIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
            && self.security_type == other.security_type
            && self.market == other.market
    }
}

impl Eq for CompositeIdentity {}

impl Hash for CompositeIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identifier.hash(state);
        self.security_type.hash(state);
        self.market.hash(state);
    }
}

impl fmt::Display for CompositeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.current_ticker(), self.identifier)
    }
}
