//! Port Interfaces
//!
//! Contracts the infrastructure adapters implement.
//!
//! ## Driven Ports (Outbound)
//!
//! - `ConstituentDataSource`: supplies constituent snapshots for a composite
//! - `SecurityLifecycleManager`: receives add/remove events for symbols and
//!   for the universe itself

mod constituent_data_source_port;
mod lifecycle_port;

pub use constituent_data_source_port::{ConstituentDataSource, DataSourceError};
pub use lifecycle_port::{LifecycleError, SecurityLifecycleManager};

#[cfg(test)]
pub use lifecycle_port::MockSecurityLifecycleManager;
