//! Domain Layer - Core universe selection logic.
//!
//! Pure Rust types with no I/O. Nothing here reads the clock, a random
//! source or the network.

/// Composite instruments and their ticker history.
pub mod composite;

/// Shared value objects (symbols, timestamps).
pub mod shared;

/// Universe identity, selection and lifecycle.
pub mod universe;
