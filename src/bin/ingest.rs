//! One-shot ingest: fetch every enabled source, merge into the existing data
//! file, and write `{ "events": [...] }` back.
//!
//! Usage: `cargo run --bin ingest [output-path]`

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use democracy_index::ingest::config::{load_config_default, ApiKeys};
use democracy_index::ingest::{providers::build_http_providers, run_once};
use democracy_index::store::{EventStore, JsonFileStore};

async fn run(store: &JsonFileStore) -> Result<()> {
    let cfg = load_config_default()?;
    let keys = ApiKeys::from_env();
    let providers = build_http_providers(&cfg, &keys)?;

    let previous = store.load().await.context("loading existing events")?;
    let outcome = run_once(&providers, &previous, chrono::Utc::now()).await;

    for s in &outcome.sources {
        tracing::info!(
            source = %s.source,
            fetched = s.fetched,
            kept = s.kept,
            failed = s.failed,
            "source summary"
        );
    }

    let written = store.save(&outcome.events).await?;
    println!(
        "Wrote {} events to {} ({} new)",
        written,
        store.path().display(),
        outcome.merge.added
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();

    let path = match std::env::args().nth(1) {
        Some(p) => std::path::PathBuf::from(p),
        None => load_config_default()
            .map(|c| c.data_path)
            .unwrap_or_else(|_| democracy_index::ingest::config::DEFAULT_DATA_PATH.into()),
    };
    let store = JsonFileStore::new(path);

    if let Err(e) = run(&store).await {
        tracing::error!(error = ?e, "ingest failed");
        // The dashboard must always have a document to render.
        if !store.path().exists() {
            if let Err(e) = store.save(&[]).await {
                tracing::error!(error = ?e, "writing empty dataset failed");
            }
        }
        std::process::exit(1);
    }
}
