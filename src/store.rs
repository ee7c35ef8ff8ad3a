//! # Event Store
//! Persistence sink for the merged collection. The real backing store is an
//! external concern; this module only fixes the contract and ships a JSON
//! file store (the `{ "events": [...] }` document) and an in-memory store.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::model::{EventItem, EventsDocument};

#[async_trait::async_trait]
pub trait EventStore: Send + Sync {
    /// Current collection, newest first. An empty store yields an empty vec.
    async fn load(&self) -> Result<Vec<EventItem>>;
    /// Replace the stored collection; returns the number of events written.
    async fn save(&self, events: &[EventItem]) -> Result<usize>;
}

/// Stores the wire document at `path`, pretty-printed.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl EventStore for JsonFileStore {
    async fn load(&self) -> Result<Vec<EventItem>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()));
            }
        };
        let doc = EventsDocument::from_json_lenient(&content)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(doc.events)
    }

    async fn save(&self, events: &[EventItem]) -> Result<usize> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        let doc = EventsDocument::new(events.to_vec());
        let body = serde_json::to_string_pretty(&doc).context("serializing events document")?;

        // Write-then-rename so readers never observe a half-written file.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("renaming into {}", self.path.display()))?;

        tracing::info!(target: "store", path = %self.path.display(), count = events.len(), "events saved");
        Ok(events.len())
    }
}

/// In-process store for tests and demos.
#[derive(Debug, Default)]
pub struct MemoryStore {
    events: Mutex<Vec<EventItem>>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<EventItem>) -> Self {
        Self {
            events: Mutex::new(events),
            saves: Mutex::new(0),
        }
    }

    /// Number of successful `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|g| *g).unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl EventStore for MemoryStore {
    async fn load(&self) -> Result<Vec<EventItem>> {
        let guard = self
            .events
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store mutex poisoned"))?;
        Ok(guard.clone())
    }

    async fn save(&self, events: &[EventItem]) -> Result<usize> {
        {
            let mut guard = self
                .events
                .lock()
                .map_err(|_| anyhow::anyhow!("memory store mutex poisoned"))?;
            *guard = events.to_vec();
        }
        if let Ok(mut n) = self.saves.lock() {
            *n += 1;
        }
        Ok(events.len())
    }
}
