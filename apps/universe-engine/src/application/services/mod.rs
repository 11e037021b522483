//! Application Services
//!
//! - `UniverseService`: creates universes, runs evaluation cycles, routes
//!   records by ticker, forwards lifecycle diffs and delisting teardowns
//! - `EvaluationCadence`: evaluation time schedules for callers

mod cadence;
mod universe_service;

pub use cadence::{EvaluationCadence, EvaluationSchedule};
pub use universe_service::{
    EngineHandle, EvaluationSettings, UniverseService, UniverseServiceError,
};
