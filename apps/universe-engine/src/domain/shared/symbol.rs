//! Symbol value object for instrument tickers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest ticker accepted by [`Symbol::validate`].
const MAX_SYMBOL_LEN: usize = 21;

/// Errors raised when a symbol fails validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SymbolError {
    /// Symbol is empty.
    #[error("symbol cannot be empty")]
    Empty,
    /// Symbol is longer than the maximum ticker length.
    #[error("symbol '{0}' exceeds maximum length")]
    TooLong(String),
    /// Symbol contains characters outside `[A-Z0-9.]`.
    #[error("symbol '{0}' contains invalid characters")]
    InvalidCharacters(String),
}

/// A trading symbol (ticker).
///
/// Examples: "AAPL", "MSFT", "BRK.B"
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Create a new Symbol.
    ///
    /// The symbol is normalized to uppercase.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_uppercase())
    }

    /// Get the symbol string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Validate the ticker.
    ///
    /// # Errors
    ///
    /// Returns error if symbol is empty, too long, or contains invalid characters.
    pub fn validate(&self) -> Result<(), SymbolError> {
        if self.0.is_empty() {
            return Err(SymbolError::Empty);
        }

        if self.0.len() > MAX_SYMBOL_LEN {
            return Err(SymbolError::TooLong(self.0.clone()));
        }

        // Class shares use a dot separator (BRK.B)
        if !self
            .0
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.')
        {
            return Err(SymbolError::InvalidCharacters(self.0.clone()));
        }

        Ok(())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_new_normalizes_case() {
        assert_eq!(Symbol::new("aapl").as_str(), "AAPL");
        assert_eq!(Symbol::new(" msft ").as_str(), "MSFT");
    }

    #[test]
    fn symbol_validate_empty() {
        assert_eq!(Symbol::new("").validate(), Err(SymbolError::Empty));
    }

    #[test]
    fn symbol_validate_too_long() {
        let s = Symbol::new("A".repeat(25));
        assert!(matches!(s.validate(), Err(SymbolError::TooLong(_))));
    }

    #[test]
    fn symbol_validate_invalid_chars() {
        assert!(Symbol::new("AAPL!").validate().is_err());
        assert!(Symbol::new("AA PL").validate().is_err());
    }

    #[test]
    fn symbol_validate_class_shares() {
        assert!(Symbol::new("BRK.B").validate().is_ok());
        assert!(Symbol::new("SPY").validate().is_ok());
    }

    #[test]
    fn symbol_ordering_is_lexicographic() {
        let mut symbols = vec![Symbol::new("MSFT"), Symbol::new("AAPL"), Symbol::new("GOOGL")];
        symbols.sort();
        assert_eq!(symbols[0].as_str(), "AAPL");
        assert_eq!(symbols[2].as_str(), "MSFT");
    }

    #[test]
    fn symbol_serde_roundtrip() {
        let s = Symbol::new("AAPL");
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, "\"AAPL\"");

        let parsed: Symbol = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, s);
    }

    #[test]
    fn symbol_hash_collapses_case() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(Symbol::new("AAPL"));
        set.insert(Symbol::new("aapl"));
        assert_eq!(set.len(), 1);
    }
}
