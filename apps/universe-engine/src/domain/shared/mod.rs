//! Shared value objects used across the domain.

mod symbol;
mod timestamp;

pub use symbol::{Symbol, SymbolError};
pub use timestamp::Timestamp;
