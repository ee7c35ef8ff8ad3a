// src/lib.rs
// Public library surface for the service binary, the ingest binary, and integration tests.

pub mod api;
pub mod ingest;
pub mod merge;
pub mod metrics;
pub mod model;
pub mod scoring;
pub mod seed;
pub mod store;
pub mod weights;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::merge::merge;
pub use crate::model::{Category, CategoryScores, CategoryWeights, Direction, EventItem};
pub use crate::scoring::{score_categories, weighted_index};

use std::sync::Arc;

use tracing::info;

use crate::ingest::config::{ApiKeys, IngestConfig};
use crate::store::{EventStore, JsonFileStore};
use crate::weights::HotReloadWeights;

pub const ENV_SEED_DEMO: &str = "DEMOCRACY_SEED_DEMO";

/// Wire store, weights and live providers from `cfg`, and load the
/// persisted collection. Falls back to the demo seed when the store is
/// empty and `DEMOCRACY_SEED_DEMO=1`.
pub async fn build_state(cfg: &IngestConfig, keys: &ApiKeys) -> anyhow::Result<AppState> {
    let store: Arc<dyn EventStore> = Arc::new(JsonFileStore::new(&cfg.data_path));
    let providers = ingest::providers::build_http_providers(cfg, keys)?;

    let mut events = match store.load().await {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = ?e, "stored events unreadable; starting empty");
            Vec::new()
        }
    };
    let seed_demo = std::env::var(ENV_SEED_DEMO).ok().is_some_and(|v| v == "1");
    if events.is_empty() && seed_demo {
        events = seed::seed_events(chrono::Utc::now());
    }

    info!(
        events = events.len(),
        providers = providers.len(),
        data_path = %cfg.data_path.display(),
        "state initialized"
    );

    Ok(AppState::new(
        events,
        HotReloadWeights::new(Some(cfg.weights_path.as_path())),
        store,
        providers,
    ))
}
