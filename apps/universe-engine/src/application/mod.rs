//! Application Layer - Use cases and port definitions.
//!
//! This layer wires the selection engine to its external collaborators:
//! the constituent data source and the security lifecycle manager.

/// Port interfaces for external systems.
pub mod ports;

/// Application services for universe management and evaluation cadence.
pub mod services;
