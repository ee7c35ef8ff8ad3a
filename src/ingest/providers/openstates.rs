//! OpenStates v3: state bills on voting and elections → Elections events.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::Mode;
use crate::ingest::classify::{magnitude_from_action, Classifier};
use crate::ingest::raw::{opt_object, opt_scalar, opt_string, parse_record, string_list, value_list};
use crate::ingest::types::SourceProvider;
use crate::ingest::{normalize_text, parse_timestamp};
use crate::model::{Category, EventItem};

pub const DEFAULT_URL: &str =
    "https://v3.openstates.org/bills?classification=bill&q=voting%20OR%20elections&sort=date&jurisdiction=US";
pub const API_KEY_HEADER: &str = "X-API-KEY";
pub const ID_PREFIX: &str = "os";
pub const CONFIDENCE: f64 = 0.85;

pub const DEFAULT_KEYWORDS: &[&str] = &[
    "expand",
    "access",
    "registration",
    "mail",
    "drop box",
    "preclearance",
    "independent",
];

#[derive(Debug, Deserialize)]
struct RawBill {
    #[serde(default, deserialize_with = "opt_scalar")]
    id: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    title: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    latest_action_date: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    updated_at: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    created_at: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    latest_action_description: Option<String>,
    #[serde(default, deserialize_with = "opt_object")]
    jurisdiction: Option<RawJurisdiction>,
    #[serde(default, deserialize_with = "string_list")]
    subjects: Vec<String>,
    #[serde(default, deserialize_with = "value_list")]
    sources: Vec<Value>,
    #[serde(default, deserialize_with = "opt_string")]
    openstates_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawJurisdiction {
    #[serde(default, deserialize_with = "opt_string")]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLink {
    #[serde(default, deserialize_with = "opt_string")]
    url: Option<String>,
}

/// Normalize raw bill records. Bills without an `id` are dropped.
pub fn normalize(records: &[Value], classifier: &Classifier, now: DateTime<Utc>) -> Vec<EventItem> {
    let mut out = Vec::with_capacity(records.len());
    for raw in records {
        let Some(bill) = parse_record::<RawBill>(raw) else {
            continue;
        };
        let Some(id) = bill.id.as_deref() else {
            tracing::debug!(target: "ingest", provider = "OpenStates", "bill without id dropped");
            continue;
        };

        let stamp = bill
            .latest_action_date
            .as_deref()
            .or(bill.updated_at.as_deref())
            .or(bill.created_at.as_deref());
        let date = parse_timestamp(stamp, now);

        let title = bill
            .title
            .as_deref()
            .map(normalize_text)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| {
                let place = bill
                    .jurisdiction
                    .as_ref()
                    .and_then(|j| j.name.as_deref())
                    .unwrap_or("State");
                format!("{place} bill")
            });

        let direction_text = format!("{} {}", title, bill.subjects.join(" "));
        let action = bill.latest_action_description.as_deref();

        let first_source = bill
            .sources
            .iter()
            .filter_map(parse_record::<RawLink>)
            .find_map(|l| l.url);
        let url = bill.openstates_url.clone().or(first_source);

        out.push(EventItem {
            id: format!("{ID_PREFIX}-{id}"),
            date,
            title,
            summary: bill.latest_action_description.clone(),
            url,
            category: Category::Elections,
            direction: classifier.direction(&direction_text),
            magnitude: magnitude_from_action(Some(action.unwrap_or("bill"))),
            confidence: CONFIDENCE,
        });
    }
    out
}

pub struct OpenStatesProvider {
    mode: Mode,
    classifier: Classifier,
}

impl OpenStatesProvider {
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

    /// Without an API key the provider stays disabled and yields nothing.
    pub fn from_url(
        url: String,
        client: reqwest::Client,
        api_key: Option<String>,
        classifier: Classifier,
    ) -> Self {
        Self {
            mode: Mode::http_with_key(url, client, API_KEY_HEADER, api_key),
            classifier,
        }
    }
}

#[async_trait]
impl SourceProvider for OpenStatesProvider {
    async fn fetch_raw(&self) -> Result<Vec<Value>> {
        self.mode.load(self.name(), &["results"]).await
    }

    fn normalize(&self, records: &[Value], now: DateTime<Utc>) -> Vec<EventItem> {
        normalize(records, &self.classifier, now)
    }

    fn name(&self) -> &'static str {
        "OpenStates"
    }
}
