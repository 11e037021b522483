//! JSON Snapshot Source
//!
//! Loads a composite's dated constituent snapshots from a JSON file:
//!
//! ```json
//! {
//!   "composite": { "identifier": "SPY R735QTJ8XC9X", "ticker": "SPY" },
//!   "mappings": [{ "effective": "2026-06-01T00:00:00Z", "ticker": "SPYX" }],
//!   "delisted_at": null,
//!   "snapshots": [
//!     {
//!       "as_of": "2026-01-02T00:00:00Z",
//!       "constituents": [{ "symbol": "AAPL", "weight": "0.071" }]
//!     }
//!   ]
//! }
//! ```
//!
//! `security_type` defaults to `equity` and `market` to `usa`.

use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

use super::in_memory::InMemoryConstituentSource;
use crate::application::ports::{ConstituentDataSource, DataSourceError};
use crate::domain::composite::{
    CompositeIdentity, Market, MappingEvent, SecurityIdentifier, SecurityType,
};
use crate::domain::shared::{Symbol, Timestamp};
use crate::domain::universe::ConstituentRecord;

// =============================================================================
// File Format
// =============================================================================

#[derive(Debug, Deserialize)]
struct SnapshotFile {
    composite: CompositeEntry,
    #[serde(default)]
    mappings: Vec<MappingEvent>,
    #[serde(default)]
    delisted_at: Option<Timestamp>,
    snapshots: Vec<SnapshotEntry>,
}

#[derive(Debug, Deserialize)]
struct CompositeEntry {
    identifier: String,
    ticker: Symbol,
    #[serde(default = "default_security_type")]
    security_type: SecurityType,
    #[serde(default = "default_market")]
    market: String,
}

const fn default_security_type() -> SecurityType {
    SecurityType::Equity
}

fn default_market() -> String {
    Market::usa().as_str().to_string()
}

#[derive(Debug, Deserialize)]
struct SnapshotEntry {
    as_of: Timestamp,
    constituents: Vec<HoldingEntry>,
}

#[derive(Debug, Deserialize)]
struct HoldingEntry {
    symbol: Symbol,
    weight: Decimal,
    #[serde(default)]
    shares_held: Option<Decimal>,
    #[serde(default)]
    market_value: Option<Decimal>,
}

impl HoldingEntry {
    fn into_record(self, as_of: Timestamp) -> ConstituentRecord {
        ConstituentRecord {
            symbol: self.symbol,
            weight: self.weight,
            as_of,
            shares_held: self.shares_held,
            market_value: self.market_value,
        }
    }
}

// =============================================================================
// Source
// =============================================================================

/// Constituent source backed by a JSON snapshot file.
#[derive(Debug, Clone)]
pub struct JsonSnapshotSource {
    composite: CompositeIdentity,
    delisted_at: Option<Timestamp>,
    snapshots: InMemoryConstituentSource<ConstituentRecord>,
}

impl JsonSnapshotSource {
    /// Load snapshots from a file.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if the file cannot be read and `Malformed` if
    /// it does not decode or carries invalid symbols or renames.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DataSourceError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| DataSourceError::Unavailable {
            message: format!("{}: {e}", path.display()),
        })?;
        Self::from_json(&raw)
    }

    /// Parse snapshots from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns `Malformed` if the document does not decode or carries
    /// invalid symbols or renames.
    pub fn from_json(raw: &str) -> Result<Self, DataSourceError> {
        let file: SnapshotFile = serde_json::from_str(raw).map_err(|e| DataSourceError::Malformed {
            message: e.to_string(),
        })?;

        let entry = file.composite;
        validate_symbol(&entry.ticker)?;
        let mut composite = CompositeIdentity::new(
            SecurityIdentifier::new(entry.identifier),
            entry.ticker,
            entry.security_type,
            Market::new(entry.market),
        );
        for event in file.mappings {
            validate_symbol(&event.ticker)?;
            composite
                .record_mapping(event)
                .map_err(|e| DataSourceError::Malformed {
                    message: e.to_string(),
                })?;
        }

        let mut snapshots = InMemoryConstituentSource::new();
        for snapshot in file.snapshots {
            let records = snapshot
                .constituents
                .into_iter()
                .map(|holding| {
                    validate_symbol(&holding.symbol)?;
                    Ok(holding.into_record(snapshot.as_of))
                })
                .collect::<Result<Vec<_>, DataSourceError>>()?;
            snapshots.insert(composite.identifier(), snapshot.as_of, records);
        }

        Ok(Self {
            composite,
            delisted_at: file.delisted_at,
            snapshots,
        })
    }

    /// Composite described by the file, renames applied.
    #[must_use]
    pub const fn composite(&self) -> &CompositeIdentity {
        &self.composite
    }

    /// Delisting time, if the composite has been delisted.
    #[must_use]
    pub const fn delisted_at(&self) -> Option<Timestamp> {
        self.delisted_at
    }

    /// Earliest and latest snapshot times.
    #[must_use]
    pub fn bounds(&self) -> Option<(Timestamp, Timestamp)> {
        let times = self.snapshots.snapshot_times(self.composite.identifier());
        Some((*times.first()?, *times.last()?))
    }
}

impl ConstituentDataSource<ConstituentRecord> for JsonSnapshotSource {
    fn fetch(
        &self,
        composite: &CompositeIdentity,
        as_of: Timestamp,
    ) -> Result<Vec<ConstituentRecord>, DataSourceError> {
        self.snapshots.fetch(composite, as_of)
    }

    fn name(&self) -> &'static str {
        "JsonSnapshot"
    }
}

fn validate_symbol(symbol: &Symbol) -> Result<(), DataSourceError> {
    symbol.validate().map_err(|e| DataSourceError::Malformed {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const DOCUMENT: &str = r#"{
        "composite": { "identifier": "SPY R735QTJ8XC9X", "ticker": "spy" },
        "mappings": [{ "effective": "2026-06-01T00:00:00Z", "ticker": "SPYX" }],
        "snapshots": [
            {
                "as_of": "2026-01-02T00:00:00Z",
                "constituents": [
                    { "symbol": "AAPL", "weight": "0.071" },
                    { "symbol": "brk.b", "weight": "0.017", "shares_held": "1200", "market_value": "560000" }
                ]
            },
            {
                "as_of": "2026-02-02T00:00:00Z",
                "constituents": [{ "symbol": "MSFT", "weight": "0.065" }]
            }
        ]
    }"#;

    #[test]
    fn loads_composite_and_snapshots_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(DOCUMENT.as_bytes()).unwrap();

        let source = JsonSnapshotSource::load(file.path()).unwrap();

        assert_eq!(source.composite().current_ticker().as_str(), "SPYX");
        assert_eq!(
            source
                .composite()
                .ticker_at(Timestamp::from_ymd(2026, 3, 1).unwrap())
                .as_str(),
            "SPY"
        );
        assert_eq!(source.delisted_at(), None);
        assert_eq!(
            source.bounds(),
            Some((
                Timestamp::from_ymd(2026, 1, 2).unwrap(),
                Timestamp::from_ymd(2026, 2, 2).unwrap()
            ))
        );
    }

    #[test]
    fn fetch_stamps_records_with_snapshot_time() {
        let source = JsonSnapshotSource::from_json(DOCUMENT).unwrap();
        let as_of = Timestamp::from_ymd(2026, 1, 15).unwrap();

        let records = source.fetch(source.composite(), as_of).unwrap();

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.as_of == Timestamp::from_ymd(2026, 1, 2).unwrap()));
        assert_eq!(records[1].symbol.as_str(), "BRK.B");
        assert_eq!(records[1].shares_held, Some(dec!(1200)));
    }

    #[test]
    fn missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = JsonSnapshotSource::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, DataSourceError::Unavailable { .. }));
    }

    #[test]
    fn invalid_json_is_malformed() {
        let err = JsonSnapshotSource::from_json("{ not json").unwrap_err();
        assert!(matches!(err, DataSourceError::Malformed { .. }));
    }

    #[test]
    fn invalid_symbol_is_malformed() {
        let raw = r#"{
            "composite": { "identifier": "SPY R735QTJ8XC9X", "ticker": "SPY" },
            "snapshots": [{
                "as_of": "2026-01-02T00:00:00Z",
                "constituents": [{ "symbol": "BRK/B", "weight": "0.01" }]
            }]
        }"#;
        let err = JsonSnapshotSource::from_json(raw).unwrap_err();
        assert!(matches!(err, DataSourceError::Malformed { .. }));
    }

    #[test]
    fn out_of_order_rename_is_malformed() {
        let raw = r#"{
            "composite": { "identifier": "SPY R735QTJ8XC9X", "ticker": "SPY" },
            "mappings": [
                { "effective": "2026-06-01T00:00:00Z", "ticker": "SPYX" },
                { "effective": "2026-03-01T00:00:00Z", "ticker": "SPYY" }
            ],
            "snapshots": []
        }"#;
        let err = JsonSnapshotSource::from_json(raw).unwrap_err();
        assert!(matches!(err, DataSourceError::Malformed { .. }));
    }
}
