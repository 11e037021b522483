//! Security Lifecycle Adapters
//!
//! Implementations of the `SecurityLifecycleManager` port.

mod logging;
mod recording;

pub use logging::LoggingLifecycleManager;
pub use recording::{LifecycleEvent, RecordingLifecycleManager};
