use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use shuttle_axum::axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::ingest::scheduler;
use crate::ingest::types::{SourceProvider, SourceReport};
use crate::merge::{merge_with_summary, MergeSummary};
use crate::model::{
    validate_entries, Category, CategoryScores, CategoryWeights, EventItem, EventsDocument,
};
use crate::scoring::{self, EventStats, ScoreHistoryPoint};
use crate::store::EventStore;
use crate::weights::HotReloadWeights;

pub const DEFAULT_HISTORY_DAYS: u32 = 90;
pub const DEFAULT_HISTORY_POINTS: usize = 60;
const MAX_HISTORY_DAYS: u32 = 3650;
const MAX_HISTORY_POINTS: usize = 500;

/// Shared state behind every handler and the refresh scheduler.
#[derive(Clone)]
pub struct AppState {
    events: Arc<RwLock<Vec<EventItem>>>,
    pub weights: Arc<HotReloadWeights>,
    pub store: Arc<dyn EventStore>,
    pub providers: Arc<Vec<Box<dyn SourceProvider>>>,
    refresh_lock: Arc<tokio::sync::Mutex<()>>,
}

impl AppState {
    pub fn new(
        events: Vec<EventItem>,
        weights: HotReloadWeights,
        store: Arc<dyn EventStore>,
        providers: Vec<Box<dyn SourceProvider>>,
    ) -> Self {
        Self {
            events: Arc::new(RwLock::new(events)),
            weights: Arc::new(weights),
            store,
            providers: Arc::new(providers),
            refresh_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Clone of the current collection (newest first).
    pub fn snapshot(&self) -> Vec<EventItem> {
        self.events
            .read()
            .map(|g| g.clone())
            .unwrap_or_default()
    }

    /// Swap in a freshly merged collection.
    pub fn replace_events(&self, events: Vec<EventItem>) {
        match self.events.write() {
            Ok(mut g) => *g = events,
            Err(_) => tracing::error!(target: "api", "events lock poisoned; keeping old collection"),
        }
    }

    /// Serializes refreshes so overlapping passes cannot interleave merges.
    pub(crate) async fn refresh_guard(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.refresh_lock.lock().await
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/events", get(list_events).post(import_events))
        .route("/categories", get(list_categories))
        .route("/scores", get(current_scores))
        .route("/index", post(index_with_weights))
        .route("/stats", get(stats))
        .route("/history", get(history))
        .route("/admin/refresh", post(admin_refresh))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn list_events(State(state): State<AppState>) -> Json<EventsDocument> {
    Json(EventsDocument::new(state.snapshot()))
}

#[derive(serde::Serialize)]
struct ImportOut {
    received: usize,
    accepted: usize,
    rejected: usize,
    merge: MergeSummary,
}

/// Merge a pasted batch into the collection (latest wins) and persist it.
/// Accepts a bare `EventItem[]` or a `{ "events": [...] }` document; entries
/// failing validation are skipped individually.
async fn import_events(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<ImportOut>, (StatusCode, String)> {
    let entries = match body {
        serde_json::Value::Array(v) => v,
        serde_json::Value::Object(mut m) => match m.remove("events") {
            Some(serde_json::Value::Array(v)) => v,
            _ => return Err(bad_import_body()),
        },
        _ => return Err(bad_import_body()),
    };

    let received = entries.len();
    let incoming = validate_entries(entries);

    // Serialized with refresh passes.
    let _guard = state.refresh_guard().await;
    let (events, merge) = merge_with_summary(&state.snapshot(), &incoming);

    if let Err(e) = state.store.save(&events).await {
        tracing::error!(target: "api", error = ?e, "persisting imported events failed");
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            "failed to persist events".to_string(),
        ));
    }
    state.replace_events(events);

    tracing::info!(
        target: "api",
        received,
        accepted = incoming.len(),
        added = merge.added,
        total = merge.after,
        "events imported"
    );
    Ok(Json(ImportOut {
        received,
        accepted: incoming.len(),
        rejected: received - incoming.len(),
        merge,
    }))
}

fn bad_import_body() -> (StatusCode, String) {
    (
        StatusCode::BAD_REQUEST,
        r#"expected an array of events or { "events": [...] }"#.to_string(),
    )
}

#[derive(serde::Serialize)]
struct CategoryInfo {
    name: Category,
    description: &'static str,
}

async fn list_categories() -> Json<Vec<CategoryInfo>> {
    Json(
        Category::ALL
            .into_iter()
            .map(|c| CategoryInfo {
                name: c,
                description: c.description(),
            })
            .collect(),
    )
}

#[derive(serde::Serialize)]
struct ScoresOut {
    computed_at: DateTime<Utc>,
    scores: CategoryScores,
    weights: CategoryWeights,
    index: f64,
}

async fn current_scores(State(state): State<AppState>) -> Json<ScoresOut> {
    let now = Utc::now();
    let scores = scoring::score_categories(&state.snapshot(), now);
    let weights = state.weights.current();
    let index = scoring::weighted_index(&scores, &weights);
    Json(ScoresOut {
        computed_at: now,
        scores,
        weights,
        index,
    })
}

#[derive(serde::Serialize)]
struct IndexOut {
    index: f64,
    weights: CategoryWeights,
}

/// Index under caller-supplied weights; categories left out weigh 1.
async fn index_with_weights(
    State(state): State<AppState>,
    Json(weights): Json<CategoryWeights>,
) -> Json<IndexOut> {
    let scores = scoring::score_categories(&state.snapshot(), Utc::now());
    Json(IndexOut {
        index: scoring::weighted_index(&scores, &weights),
        weights,
    })
}

async fn stats(State(state): State<AppState>) -> Json<EventStats> {
    Json(scoring::event_stats(&state.snapshot()))
}

#[derive(serde::Deserialize)]
struct HistoryQuery {
    days: Option<u32>,
    points: Option<usize>,
}

async fn history(
    State(state): State<AppState>,
    Query(q): Query<HistoryQuery>,
) -> Json<Vec<ScoreHistoryPoint>> {
    let days = q.days.unwrap_or(DEFAULT_HISTORY_DAYS).min(MAX_HISTORY_DAYS);
    let points = q
        .points
        .unwrap_or(DEFAULT_HISTORY_POINTS)
        .min(MAX_HISTORY_POINTS);
    Json(scoring::index_series(
        &state.snapshot(),
        &state.weights.current(),
        Utc::now(),
        days,
        points,
    ))
}

#[derive(serde::Serialize)]
struct RefreshOut {
    total: usize,
    merge: MergeSummary,
    sources: Vec<SourceReport>,
}

async fn admin_refresh(State(state): State<AppState>) -> Json<RefreshOut> {
    let outcome = scheduler::refresh_once(&state).await;
    Json(RefreshOut {
        total: outcome.events.len(),
        merge: outcome.merge,
        sources: outcome.sources,
    })
}
