//! Democracy Index Service: binary entrypoint
//! Boots the Axum HTTP server, wiring routes, shared state, the periodic
//! refresh task, and the Prometheus endpoint.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use democracy_index::ingest::config::{load_config_default, ApiKeys};
use democracy_index::ingest::scheduler::{spawn_refresh_scheduler, RefreshSchedulerCfg};
use democracy_index::metrics::Metrics;

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - DEMOCRACY_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("DEMOCRACY_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ingest=info,refresh=info,warn"));

    // Shuttle may already own the global subscriber; that's fine.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let cfg = load_config_default()?;
    let keys = ApiKeys::from_env();

    let state = democracy_index::build_state(&cfg, &keys).await?;

    // Recorder first: the scheduler's immediate tick already emits metrics.
    let metrics = Metrics::init(cfg.refresh_interval_secs)?;

    spawn_refresh_scheduler(
        RefreshSchedulerCfg {
            interval_secs: cfg.refresh_interval_secs,
        },
        state.clone(),
    );

    let router = democracy_index::router(state).merge(metrics.router());

    Ok(router.into())
}
