//! Constituent Data Source Adapters
//!
//! Implementations of the `ConstituentDataSource` port.

mod in_memory;
mod json_snapshot;

pub use in_memory::InMemoryConstituentSource;
pub use json_snapshot::JsonSnapshotSource;
