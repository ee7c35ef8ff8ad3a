//! GDELT DOC 2.0 article list: protest and press-freedom coverage → Civil Society events.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::Mode;
use crate::ingest::classify::Classifier;
use crate::ingest::raw::{opt_string, parse_record};
use crate::ingest::types::SourceProvider;
use crate::ingest::{normalize_text, parse_timestamp};
use crate::model::{Category, EventItem};

pub const DEFAULT_URL: &str = "https://api.gdeltproject.org/api/v2/doc/doc?query=protest%20OR%20%22press%20freedom%22%20sourcecountry:US&mode=ArtList&format=json&maxrecords=50";
pub const ID_PREFIX: &str = "gd";
pub const CONFIDENCE: f64 = 0.75;
pub const MAGNITUDE: f64 = 1.5;

pub const DEFAULT_KEYWORDS: &[&str] = &["protest", "march", "rally", "press freedom", "journalist"];

#[derive(Debug, Deserialize)]
struct RawArticle {
    #[serde(default, deserialize_with = "opt_string")]
    url: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    guid: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    seendate: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    title: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    sourcecountry: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    source: Option<String>,
}

/// Normalize raw article records. Articles with neither `url` nor `guid` are
/// dropped: nothing else about an article is stable enough to key on.
pub fn normalize(records: &[Value], classifier: &Classifier, now: DateTime<Utc>) -> Vec<EventItem> {
    let mut out = Vec::with_capacity(records.len());
    for raw in records {
        let Some(art) = parse_record::<RawArticle>(raw) else {
            continue;
        };
        let Some(key) = art.url.as_deref().or(art.guid.as_deref()) else {
            tracing::debug!(target: "ingest", provider = "GDELT", "article without url/guid dropped");
            continue;
        };

        let title = art
            .title
            .as_deref()
            .map(normalize_text)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Civic action".to_string());

        let summary = art.sourcecountry.as_deref().map(|country| {
            format!("{} · {}", country, art.source.as_deref().unwrap_or_default())
                .trim()
                .trim_end_matches('·')
                .trim()
                .to_string()
        });

        out.push(EventItem {
            id: format!("{ID_PREFIX}-{key}"),
            date: parse_timestamp(art.seendate.as_deref(), now),
            direction: classifier.direction(&title),
            title,
            summary,
            url: art.url.clone(),
            category: Category::CivilSociety,
            magnitude: MAGNITUDE,
            confidence: CONFIDENCE,
        });
    }
    out
}

pub struct GdeltProvider {
    mode: Mode,
    classifier: Classifier,
}

impl GdeltProvider {
    pub fn from_fixture_str(s: &str, classifier: Classifier) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
            classifier,
        }
    }

    /// Fixture-backed provider using the built-in keyword list.
    pub fn from_fixture_default(s: &str) -> Result<Self> {
        Ok(Self::from_fixture_str(
            s,
            Classifier::from_keywords(DEFAULT_KEYWORDS)?,
        ))
    }

    pub fn from_url(url: String, client: reqwest::Client, classifier: Classifier) -> Self {
        Self {
            mode: Mode::http(url, client),
            classifier,
        }
    }
}

#[async_trait]
impl SourceProvider for GdeltProvider {
    async fn fetch_raw(&self) -> Result<Vec<Value>> {
        self.mode.load(self.name(), &["articles"]).await
    }

    fn normalize(&self, records: &[Value], now: DateTime<Utc>) -> Vec<EventItem> {
        normalize(records, &self.classifier, now)
    }

    fn name(&self) -> &'static str {
        "GDELT"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Direction;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        "2025-03-01T00:00:00Z".parse().unwrap()
    }

    fn cls() -> Classifier {
        Classifier::from_keywords(DEFAULT_KEYWORDS).unwrap()
    }

    #[test]
    fn article_keyed_by_url_with_compact_seendate() {
        let rec = json!({
            "url": "https://news.example/a1",
            "title": "Thousands rally for press freedom",
            "seendate": "20250227T153000Z",
            "sourcecountry": "United States",
            "source": "news.example"
        });
        let out = normalize(&[rec], &cls(), now());
        let e = &out[0];
        assert_eq!(e.id, "gd-https://news.example/a1");
        assert_eq!(e.direction, Direction::Democratic);
        assert_eq!(e.date, "2025-02-27T15:30:00Z".parse::<DateTime<Utc>>().unwrap());
        assert_eq!(e.summary.as_deref(), Some("United States · news.example"));
        assert_eq!(e.category, Category::CivilSociety);
        assert_eq!(e.magnitude, MAGNITUDE);
        assert_eq!(e.confidence, CONFIDENCE);
    }

    #[test]
    fn guid_fallback_and_placeholder_title() {
        let out = normalize(&[json!({ "guid": "g-77", "sourcecountry": "US" })], &cls(), now());
        assert_eq!(out[0].id, "gd-g-77");
        assert_eq!(out[0].title, "Civic action");
        assert_eq!(out[0].url, None);
        assert_eq!(out[0].summary.as_deref(), Some("US"));
        assert_eq!(out[0].direction, Direction::Autocratic);
    }

    #[test]
    fn article_without_url_or_guid_is_dropped() {
        let recs = vec![
            json!({ "title": "Crackdown on reporters", "seendate": "20250227T153000Z" }),
            json!({ "url": "https://news.example/kept" }),
        ];
        let out = normalize(&recs, &cls(), now());
        assert_eq!(out.len(), 1);
        assert!(out.len() < recs.len());
    }
}
