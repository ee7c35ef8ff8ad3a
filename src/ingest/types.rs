// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::model::EventItem;

/// One external event source: fetches raw records and normalizes them.
///
/// `fetch_raw` is the only fallible, side-effecting step; `normalize` is pure
/// and drops records it cannot identify.
#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch_raw(&self) -> Result<Vec<Value>>;
    fn normalize(&self, records: &[Value], now: DateTime<Utc>) -> Vec<EventItem>;
    fn name(&self) -> &'static str;
}

/// Per-source outcome of one ingest pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct SourceReport {
    pub source: String,
    pub fetched: usize,
    pub kept: usize,
    pub failed: bool,
}

impl SourceReport {
    pub fn dropped(&self) -> usize {
        self.fetched.saturating_sub(self.kept)
    }
}
