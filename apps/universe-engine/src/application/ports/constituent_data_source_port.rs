//! Constituent Data Source Port (Driven Port)
//!
//! Supplies the complete constituent snapshot of a composite as of a point
//! in time.

use crate::domain::composite::CompositeIdentity;
use crate::domain::shared::Timestamp;

/// Data source error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataSourceError {
    /// No snapshot exists for the composite.
    #[error("no constituent data for {0}")]
    NoData(String),

    /// Backing store could not be read.
    #[error("constituent data unavailable: {message}")]
    Unavailable {
        /// Failure description.
        message: String,
    },

    /// Stored data could not be decoded.
    #[error("constituent data malformed: {message}")]
    Malformed {
        /// Failure description.
        message: String,
    },
}

/// Port for fetching constituent snapshots.
pub trait ConstituentDataSource<R> {
    /// Fetch the snapshot of `composite` in effect at `as_of`.
    ///
    /// May return an empty snapshot. Must not return records dated after
    /// `as_of`.
    fn fetch(&self, composite: &CompositeIdentity, as_of: Timestamp)
    -> Result<Vec<R>, DataSourceError>;

    /// Get the name of this data source.
    fn name(&self) -> &'static str;
}
