//! CourtListener REST v3: federal opinions on voting and press freedom → Judicial events.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::Mode;
use crate::ingest::classify::Classifier;
use crate::ingest::raw::{opt_object, opt_scalar, opt_string, parse_record};
use crate::ingest::types::SourceProvider;
use crate::ingest::{normalize_text, parse_timestamp};
use crate::model::{Category, EventItem};

pub const DEFAULT_URL: &str = "https://www.courtlistener.com/api/rest/v3/opinions/?search=voting%20rights%20OR%20election%20law&order_by=-dateFiled&docket_court__jurisdiction=F";
pub const SITE_ROOT: &str = "https://www.courtlistener.com";
pub const ID_PREFIX: &str = "cl";
pub const CONFIDENCE: f64 = 0.9;
/// Opinions are always the top magnitude tier.
pub const MAGNITUDE: f64 = 3.0;

pub const DEFAULT_KEYWORDS: &[&str] = &["protect", "expand", "enjoin", "strike"];

#[derive(Debug, Deserialize)]
struct RawOpinion {
    #[serde(default, deserialize_with = "opt_scalar")]
    id: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    date_filed: Option<String>,
    #[serde(default, rename = "caseName", deserialize_with = "opt_string")]
    case_name: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    absolute_url: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    citation: Option<String>,
    #[serde(default, deserialize_with = "opt_object")]
    cluster: Option<RawCluster>,
}

#[derive(Debug, Deserialize)]
struct RawCluster {
    #[serde(default, deserialize_with = "opt_string")]
    opinion_text: Option<String>,
}

/// Normalize raw opinion records. Opinions without an `id` are dropped.
pub fn normalize(records: &[Value], classifier: &Classifier, now: DateTime<Utc>) -> Vec<EventItem> {
    let mut out = Vec::with_capacity(records.len());
    for raw in records {
        let Some(op) = parse_record::<RawOpinion>(raw) else {
            continue;
        };
        let Some(id) = op.id.as_deref() else {
            tracing::debug!(target: "ingest", provider = "CourtListener", "opinion without id dropped");
            continue;
        };

        let title = op
            .case_name
            .as_deref()
            .or(op.absolute_url.as_deref())
            .map(normalize_text)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Court opinion".to_string());

        let opinion_text = op
            .cluster
            .as_ref()
            .and_then(|c| c.opinion_text.as_deref())
            .unwrap_or_default();
        let text = format!(
            "{} {} {}",
            op.case_name.as_deref().unwrap_or_default(),
            op.citation.as_deref().unwrap_or_default(),
            opinion_text
        );

        out.push(EventItem {
            id: format!("{ID_PREFIX}-{id}"),
            date: parse_timestamp(op.date_filed.as_deref(), now),
            title,
            summary: op.citation.clone(),
            url: op.absolute_url.as_deref().map(|p| format!("{SITE_ROOT}{p}")),
            category: Category::Judicial,
            direction: classifier.direction(&text),
            magnitude: MAGNITUDE,
            confidence: CONFIDENCE,
        });
    }
    out
}

pub struct CourtListenerProvider {
    mode: Mode,
    classifier: Classifier,
}

impl CourtListenerProvider {
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
impl SourceProvider for CourtListenerProvider {
    async fn fetch_raw(&self) -> Result<Vec<Value>> {
        self.mode.load(self.name(), &["results"]).await
    }

    fn normalize(&self, records: &[Value], now: DateTime<Utc>) -> Vec<EventItem> {
        normalize(records, &self.classifier, now)
    }

    fn name(&self) -> &'static str {
        "CourtListener"
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
    fn opinion_maps_url_and_cluster_text() {
        let rec = json!({
            "id": 4411,
            "caseName": "League of Voters v. State",
            "date_filed": "2024-11-05",
            "absolute_url": "/opinion/4411/league-v-state/",
            "citation": "123 F.4th 456",
            "cluster": { "opinion_text": "We ENJOIN enforcement of the statute." }
        });
        let out = normalize(&[rec], &cls(), now());
        let e = &out[0];
        assert_eq!(e.id, "cl-4411");
        assert_eq!(e.title, "League of Voters v. State");
        assert_eq!(
            e.url.as_deref(),
            Some("https://www.courtlistener.com/opinion/4411/league-v-state/")
        );
        assert_eq!(e.summary.as_deref(), Some("123 F.4th 456"));
        assert_eq!(e.direction, Direction::Democratic);
        assert_eq!(e.magnitude, MAGNITUDE);
        assert_eq!(e.category, Category::Judicial);
        assert_eq!(e.date, "2024-11-05T00:00:00Z".parse::<DateTime<Utc>>().unwrap());
    }

    #[test]
    fn title_falls_back_to_placeholder() {
        let out = normalize(&[json!({ "id": "x9", "caseName": 12 })], &cls(), now());
        assert_eq!(out[0].title, "Court opinion");
        assert_eq!(out[0].url, None);
        assert_eq!(out[0].direction, Direction::Autocratic);
    }

    #[test]
    fn opinion_without_id_is_dropped() {
        let recs = vec![json!({ "caseName": "Nameless v. Nobody" }), json!({ "id": null })];
        assert!(normalize(&recs, &cls(), now()).is_empty());
    }
}
