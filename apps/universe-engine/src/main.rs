//! Universe Engine Binary
//!
//! Replays a composite's constituent snapshots on an evaluation cadence and
//! prints the resulting lifecycle events as JSON.
//!
//! # Usage
//!
//! ```bash
//! UNIVERSE_SNAPSHOT_PATH=spy.json cargo run --bin universe-engine
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `UNIVERSE_SNAPSHOT_PATH`: JSON snapshot file
//!
//! ## Optional
//! - `UNIVERSE_CADENCE`: daily | weekly | monthly (default: monthly)
//! - `UNIVERSE_MIN_CONSTITUENTS`: Minimum records per snapshot (default: 0)
//! - `UNIVERSE_REQUIRED_SYMBOL`: Symbol every selection must contain
//! - `UNIVERSE_START` / `UNIVERSE_END`: RFC 3339 evaluation window
//! - `OTEL_ENABLED`: Enable OpenTelemetry (default: true)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: <http://localhost:4317>)
//! - `OTEL_SERVICE_NAME`: Service name (default: cream-universe-engine)
//! - `RUST_LOG`: Log filter (default: universe_engine=info)

use anyhow::{Context, bail};
use chrono::Duration;
use universe_engine::infrastructure::telemetry;
use universe_engine::{
    ConstituentRecord, EngineConfig, JsonSnapshotSource, LoggingLifecycleManager,
    RecordingLifecycleManager, RequireConstituent, SelectionFilter, Timestamp, UniverseService,
    init_metrics,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    let _telemetry_guard = telemetry::init().context("failed to initialize telemetry")?;

    tracing::info!("Starting Universe Engine");

    let _metrics_handle = init_metrics().context("failed to install metrics recorder")?;

    let config = EngineConfig::from_env()?;
    log_config(&config);

    let source = JsonSnapshotSource::load(&config.snapshot_path)
        .with_context(|| format!("failed to load {}", config.snapshot_path.display()))?;
    let composite = source.composite().clone();
    let delisted_at = source.delisted_at();

    let Some((start, end)) = evaluation_window(&config, source.bounds()) else {
        bail!("{} holds no snapshots and no window is configured", config.snapshot_path.display());
    };

    let filter: Option<Box<dyn SelectionFilter<ConstituentRecord>>> = config
        .required_symbol
        .clone()
        .map(|symbol| {
            Box::new(RequireConstituent::new(symbol)) as Box<dyn SelectionFilter<ConstituentRecord>>
        });

    let lifecycle = LoggingLifecycleManager::new(RecordingLifecycleManager::new());
    let mut service = UniverseService::new(source, lifecycle);
    let (universe, handle) = service.create_universe(composite.clone(), config.evaluation, filter)?;

    let mut delisting_pending = delisted_at.filter(|at| *at < end);
    for as_of in config.evaluation.cadence.schedule(start, end) {
        if let Some(at) = delisting_pending.filter(|at| *at <= as_of) {
            service.notify_delisted(&composite, at)?;
            delisting_pending = None;
        }

        // Failed cycles leave the universe untouched; the next tick retries.
        if let Err(e) = service.run_cycle(&handle, as_of) {
            tracing::warn!(
                universe = %universe,
                as_of = %as_of,
                error = %e,
                "Evaluation cycle failed"
            );
        }
    }
    if let Some(at) = delisting_pending {
        service.notify_delisted(&composite, at)?;
    }

    if let Some(engine) = service.engine(&handle) {
        tracing::info!(
            universe = %universe,
            members = engine.membership().len(),
            last_evaluated = ?engine.last_evaluated().map(|t| t.to_rfc3339()),
            delisted = engine.is_delisted(),
            "Replay complete"
        );
    }

    let events = service.lifecycle().inner().events();
    println!("{}", serde_json::to_string_pretty(events)?);

    Ok(())
}

/// Configured window, falling back to the snapshot bounds.
///
/// The fallback end is one day past the last snapshot so that it is evaluated.
fn evaluation_window(
    config: &EngineConfig,
    bounds: Option<(Timestamp, Timestamp)>,
) -> Option<(Timestamp, Timestamp)> {
    let start = config.start.or_else(|| bounds.map(|(first, _)| first))?;
    let end = config
        .end
        .or_else(|| bounds.map(|(_, last)| last.shifted(Duration::days(1))))?;
    Some((start, end))
}

fn load_dotenv() {
    if dotenvy::dotenv().is_err() {
        load_dotenv_from_ancestors();
    }
}

/// Log the parsed configuration.
fn log_config(config: &EngineConfig) {
    tracing::info!(
        snapshot_path = %config.snapshot_path.display(),
        cadence = config.evaluation.cadence.as_str(),
        min_constituents = config.evaluation.min_constituents,
        required_symbol = config.required_symbol.as_ref().map(|s| s.as_str()),
        "Configuration loaded"
    );
}

/// Load .env file from any ancestor directory.
fn load_dotenv_from_ancestors() {
    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}
