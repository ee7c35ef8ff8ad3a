//! ProPublica Congress API: recent roll-call votes → Legislative events.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::Mode;
use crate::ingest::classify::{magnitude_from_action, Classifier};
use crate::ingest::raw::{opt_object, opt_scalar, opt_string, parse_record};
use crate::ingest::types::SourceProvider;
use crate::ingest::{normalize_text, parse_timestamp};
use crate::model::{Category, EventItem};

pub const DEFAULT_URL: &str = "https://api.propublica.org/congress/v1/both/votes/recent.json";
pub const API_KEY_HEADER: &str = "X-API-Key";
pub const ID_PREFIX: &str = "pp";
pub const CONFIDENCE: f64 = 0.9;

/// Matched against the vote result: a passed measure counts as democratic.
pub const DEFAULT_KEYWORDS: &[&str] = &["passed"];

#[derive(Debug, Default, Deserialize)]
struct RawVote {
    #[serde(default, deserialize_with = "opt_string")]
    vote_id: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    chamber: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    congress: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    session: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    roll_call: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    description: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    question: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    date: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    time: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    result: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    url: Option<String>,
    #[serde(default, deserialize_with = "opt_object")]
    bill: Option<RawBill>,
}

#[derive(Debug, Default, Deserialize)]
struct RawBill {
    #[serde(default, deserialize_with = "opt_string")]
    title: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    latest_action: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    govtrack_url: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    congressdotgov_url: Option<String>,
}

impl RawVote {
    /// Native `vote_id`, else chamber-congress-session-roll_call from
    /// whichever parts are present. `None` when nothing identifies the vote.
    fn key(&self) -> Option<String> {
        if let Some(id) = &self.vote_id {
            return Some(id.clone());
        }
        let parts: Vec<&str> = [&self.chamber, &self.congress, &self.session, &self.roll_call]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .collect();
        (!parts.is_empty()).then(|| parts.join("-"))
    }
}

/// Normalize raw vote records. Records without an identifying key are dropped.
pub fn normalize(records: &[Value], classifier: &Classifier, now: DateTime<Utc>) -> Vec<EventItem> {
    let mut out = Vec::with_capacity(records.len());
    for raw in records {
        let Some(vote) = parse_record::<RawVote>(raw) else {
            continue;
        };
        let Some(key) = vote.key() else {
            tracing::debug!(target: "ingest", provider = "ProPublica", "vote without id dropped");
            continue;
        };

        let chamber = vote
            .chamber
            .as_deref()
            .map(str::to_uppercase)
            .unwrap_or_else(|| "CONGRESS".to_string());
        let subject = vote
            .description
            .as_deref()
            .or(vote.question.as_deref())
            .unwrap_or("Measure");
        let title = normalize_text(&format!("{chamber} vote: {subject}"));

        let stamp = vote.date.as_deref().map(|d| {
            let t = vote.time.as_deref().unwrap_or("00:00");
            format!("{d}T{t}Z")
        });
        let date = parse_timestamp(stamp.as_deref(), now);

        let result = vote.result.as_deref().unwrap_or_default();
        let bill = vote.bill.unwrap_or_default();
        let action = bill
            .latest_action
            .as_deref()
            .or((!result.is_empty()).then_some(result))
            .unwrap_or("vote");

        let summary = bill
            .title
            .clone()
            .or_else(|| vote.description.clone())
            .or_else(|| vote.question.clone());
        let url = vote
            .url
            .clone()
            .or(bill.govtrack_url)
            .or(bill.congressdotgov_url);

        out.push(EventItem {
            id: format!("{ID_PREFIX}-{key}"),
            date,
            title,
            summary,
            url,
            category: Category::Legislative,
            direction: classifier.direction(result),
            magnitude: magnitude_from_action(Some(action)),
            confidence: CONFIDENCE,
        });
    }
    out
}

pub struct ProPublicaProvider {
    mode: Mode,
    classifier: Classifier,
}

impl ProPublicaProvider {
    pub fn from_fixture_str(s: &str, classifier: Classifier) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
            classifier,
        }
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

    /// Fixture-backed provider using the built-in keyword list.
    pub fn from_fixture_default(s: &str) -> Result<Self> {
        Ok(Self::from_fixture_str(
            s,
            Classifier::from_keywords(DEFAULT_KEYWORDS)?,
        ))
    }
}

#[async_trait]
impl SourceProvider for ProPublicaProvider {
    async fn fetch_raw(&self) -> Result<Vec<Value>> {
        self.mode.load(self.name(), &["results", "votes"]).await
    }

    fn normalize(&self, records: &[Value], now: DateTime<Utc>) -> Vec<EventItem> {
        normalize(records, &self.classifier, now)
    }

    fn name(&self) -> &'static str {
        "ProPublica"
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
    fn full_vote_maps_all_fields() {
        let rec = json!({
            "vote_id": "h123-2025",
            "chamber": "House",
            "description": "Election Security Act",
            "date": "2025-02-10",
            "time": "14:32:00",
            "result": "Passed",
            "bill": {
                "title": "To secure federal elections",
                "latest_action": "Passed House",
                "govtrack_url": "https://www.govtrack.us/x"
            }
        });
        let out = normalize(&[rec], &cls(), now());
        assert_eq!(out.len(), 1);
        let e = &out[0];
        assert_eq!(e.id, "pp-h123-2025");
        assert_eq!(e.title, "HOUSE vote: Election Security Act");
        assert_eq!(e.date, "2025-02-10T14:32:00Z".parse::<DateTime<Utc>>().unwrap());
        assert_eq!(e.summary.as_deref(), Some("To secure federal elections"));
        assert_eq!(e.url.as_deref(), Some("https://www.govtrack.us/x"));
        assert_eq!(e.category, Category::Legislative);
        assert_eq!(e.direction, Direction::Democratic);
        assert_eq!(e.magnitude, 2.5);
        assert_eq!(e.confidence, CONFIDENCE);
    }

    #[test]
    fn fallback_key_from_roll_call_fields_is_stable() {
        let rec = json!({
            "chamber": "Senate", "congress": 118, "session": 2, "roll_call": 301,
            "question": "On the Cloture Motion", "result": "Rejected"
        });
        let a = normalize(&[rec.clone()], &cls(), now());
        let b = normalize(&[rec], &cls(), now() + chrono::Duration::days(1));
        assert_eq!(a[0].id, "pp-Senate-118-2-301");
        assert_eq!(a[0].id, b[0].id);
        assert_eq!(a[0].direction, Direction::Autocratic);
        assert_eq!(a[0].title, "SENATE vote: On the Cloture Motion");
    }

    #[test]
    fn vote_without_any_identifying_field_is_dropped() {
        let recs = vec![
            json!({ "description": "Anonymous measure", "result": "Passed" }),
            json!({ "vote_id": "ok-1" }),
            json!(17),
        ];
        let out = normalize(&recs, &cls(), now());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "pp-ok-1");
        assert_eq!(out[0].title, "CONGRESS vote: Measure");
        assert_eq!(out[0].date, now());
        assert_eq!(out[0].magnitude, 2.5, "defaults to the 'vote' tier");
    }
}
