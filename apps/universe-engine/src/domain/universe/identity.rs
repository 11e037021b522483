//! Universe Identity Resolution
//!
//! Derives the synthetic identity of a constituent universe from its
//! composite. The derivation is a pure function of a fixed namespace tag,
//! the composite's security type, market and permanent identifier. It never
//! consults the clock or a random source, so constructing the same universe
//! twice (or after the composite has been renamed) yields the same identity.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::composite::{CompositeIdentity, Market, SecurityIdentifier, SecurityType};

/// Namespace tag carried by every universe identifier.
pub const UNIVERSE_TAG: &str = "constituents-universe";

/// Fixed UUID namespace for universe identifiers.
const UNIVERSE_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2d3e_8a4b_5c6d_9e7f_0a1b_2c3d_4e5f);

/// Synthetic identity of a derived universe.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UniverseIdentity {
    identifier: SecurityIdentifier,
    security_type: SecurityType,
    market: Market,
}

impl UniverseIdentity {
    /// Identifier string, always prefixed with [`UNIVERSE_TAG`].
    #[must_use]
    pub const fn identifier(&self) -> &SecurityIdentifier {
        &self.identifier
    }

    /// Security type inherited from the composite.
    #[must_use]
    pub const fn security_type(&self) -> SecurityType {
        self.security_type
    }

    /// Market inherited from the composite.
    #[must_use]
    pub const fn market(&self) -> &Market {
        &self.market
    }

    /// View this universe as an instrument identity.
    ///
    /// Resolving the result yields `self` again.
    #[must_use]
    pub fn as_composite(&self) -> CompositeIdentity {
        CompositeIdentity::new(
            self.identifier.clone(),
            self.identifier.as_str(),
            self.security_type,
            self.market.clone(),
        )
    }
}

impl fmt::Display for UniverseIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier)
    }
}

/// Check whether an identifier already names a universe.
#[must_use]
pub fn is_universe_identifier(identifier: &SecurityIdentifier) -> bool {
    identifier
        .as_str()
        .strip_prefix(UNIVERSE_TAG)
        .is_some_and(|rest| rest.starts_with('-'))
}

/// Resolves composites to their universe identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompositeSymbolResolver;

impl CompositeSymbolResolver {
    /// Create a resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Resolve the universe identity for `composite`.
    ///
    /// Idempotent: an identity that already carries the universe tag is
    /// returned as-is rather than wrapped again.
    #[must_use]
    pub fn resolve(&self, composite: &CompositeIdentity) -> UniverseIdentity {
        if is_universe_identifier(composite.identifier()) {
            return UniverseIdentity {
                identifier: composite.identifier().clone(),
                security_type: composite.security_type(),
                market: composite.market().clone(),
            };
        }

        let name = format!(
            "{UNIVERSE_TAG}|{}|{}|{}",
            composite.security_type(),
            composite.market(),
            composite.identifier()
        );
        let uuid = Uuid::new_v5(&UNIVERSE_NAMESPACE, name.as_bytes());

        UniverseIdentity {
            identifier: SecurityIdentifier::new(format!(
                "{UNIVERSE_TAG}-{}-{}-{}",
                composite.market(),
                composite.security_type(),
                uuid.as_hyphenated()
            )),
            security_type: composite.security_type(),
            market: composite.market().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::composite::MappingEvent;
    use crate::domain::shared::Timestamp;

    fn spy() -> CompositeIdentity {
        CompositeIdentity::us_equity("SPY R735QTJ8XC9X", "SPY")
    }

    #[test]
    fn resolve_is_deterministic() {
        let a = CompositeSymbolResolver::new().resolve(&spy());
        let b = CompositeSymbolResolver::new().resolve(&spy());
        assert_eq!(a, b);
    }

    #[test]
    fn resolve_carries_tag_market_and_type() {
        let universe = CompositeSymbolResolver::new().resolve(&spy());
        let id = universe.identifier().as_str();

        assert!(id.starts_with("constituents-universe-usa-equity-"));
        assert!(is_universe_identifier(universe.identifier()));
        assert_eq!(universe.security_type(), SecurityType::Equity);
        assert_eq!(universe.market(), &Market::usa());
    }

    #[test]
    fn resolve_is_idempotent() {
        let resolver = CompositeSymbolResolver::new();
        let once = resolver.resolve(&spy());
        let twice = resolver.resolve(&once.as_composite());
        assert_eq!(once, twice);
    }

    #[test]
    fn resolve_survives_rename() {
        let resolver = CompositeSymbolResolver::new();
        let mut composite = CompositeIdentity::us_equity("QQQ RIWIV7K5Z9LX", "QQQQ");
        let before = resolver.resolve(&composite);

        composite
            .record_mapping(MappingEvent::new(
                Timestamp::parse("2011-03-23T00:00:00Z").unwrap(),
                "QQQ",
            ))
            .unwrap();

        assert_eq!(before, resolver.resolve(&composite));
    }

    #[test]
    fn distinct_composites_get_distinct_universes() {
        let resolver = CompositeSymbolResolver::new();
        let qqq = CompositeIdentity::us_equity("QQQ RIWIV7K5Z9LX", "QQQ");
        assert_ne!(resolver.resolve(&spy()), resolver.resolve(&qqq));
    }

    #[test]
    fn tag_prefix_alone_is_not_a_universe() {
        assert!(!is_universe_identifier(&SecurityIdentifier::new(
            "constituents-universeX"
        )));
        assert!(!is_universe_identifier(&SecurityIdentifier::new("SPY")));
    }
}
