// src/ingest/scheduler.rs
use metrics::gauge;
use tokio::task::JoinHandle;

use crate::api::AppState;
use crate::ingest::IngestOutcome;
use crate::scoring::{score_categories, weighted_index};

#[derive(Clone, Copy, Debug)]
pub struct RefreshSchedulerCfg {
    pub interval_secs: u64,
}

/// Run one ingest pass against the live collection in `state`, persist the
/// merged result, and swap it in. Store failures are logged; the in-memory
/// collection is still updated so the dashboard keeps serving fresh data.
pub async fn refresh_once(state: &AppState) -> IngestOutcome {
    let _guard = state.refresh_guard().await;

    let now = chrono::Utc::now();
    let previous = state.snapshot();
    let outcome = crate::ingest::run_once(&state.providers, &previous, now).await;

    if let Err(e) = state.store.save(&outcome.events).await {
        tracing::warn!(target: "refresh", error = ?e, "persisting events failed");
    }
    state.replace_events(outcome.events.clone());

    let index = weighted_index(
        &score_categories(&outcome.events, now),
        &state.weights.current(),
    );
    gauge!("democracy_index").set(index);

    tracing::info!(
        target: "refresh",
        total = outcome.events.len(),
        added = outcome.merge.added,
        failed_sources = outcome.sources.iter().filter(|s| s.failed).count(),
        index,
        "refresh complete"
    );
    outcome
}

/// Spawn a periodic refresh. The first tick fires immediately.
pub fn spawn_refresh_scheduler(cfg: RefreshSchedulerCfg, state: AppState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = std::time::Duration::from_secs(cfg.interval_secs.max(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            refresh_once(&state).await;
        }
    })
}
