//! # Event Model
//! Canonical event schema shared by normalizers, merger, scorer and the HTTP layer.
//!
//! The JSON shape of [`EventItem`] and [`EventsDocument`] is the wire contract for
//! storage and display tooling, so field names must not change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Fixed, closed set of categories an event can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Legislative,
    Executive,
    Judicial,
    Elections,
    #[serde(rename = "Rights & Liberties")]
    RightsAndLiberties,
    #[serde(rename = "Civil Society")]
    CivilSociety,
    #[serde(rename = "Political Violence")]
    PoliticalViolence,
}

impl Category {
    /// Canonical order, used everywhere categories are enumerated.
    pub const ALL: [Category; 7] = [
        Category::Legislative,
        Category::Executive,
        Category::Judicial,
        Category::Elections,
        Category::RightsAndLiberties,
        Category::CivilSociety,
        Category::PoliticalViolence,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Legislative => "Legislative",
            Category::Executive => "Executive",
            Category::Judicial => "Judicial",
            Category::Elections => "Elections",
            Category::RightsAndLiberties => "Rights & Liberties",
            Category::CivilSociety => "Civil Society",
            Category::PoliticalViolence => "Political Violence",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Category::Legislative => "Law-making, oversight, and checks on executive power.",
            Category::Executive => {
                "Administrative actions, transparency, and rule implementation."
            }
            Category::Judicial => "Courts, judicial independence, and rule-of-law decisions.",
            Category::Elections => "Voting access, election integrity, and representation.",
            Category::RightsAndLiberties => {
                "Civil liberties, minority protections, and free expression."
            }
            Category::CivilSociety => "Media, organizing, and civic participation.",
            Category::PoliticalViolence => {
                "Political intimidation, violence, and security of participants."
            }
        }
    }

    /// Case-sensitive lookup by wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// +1 moves toward democratic norms, -1 toward autocratic drift.
/// Serialized as the bare integers `1` / `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Direction {
    Democratic,
    Autocratic,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::Democratic => 1.0,
            Direction::Autocratic => -1.0,
        }
    }

    /// `true` → Democratic, `false` → Autocratic.
    pub fn from_flag(democratic: bool) -> Self {
        if democratic {
            Direction::Democratic
        } else {
            Direction::Autocratic
        }
    }
}

impl TryFrom<i8> for Direction {
    type Error = String;

    fn try_from(v: i8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Direction::Democratic),
            -1 => Ok(Direction::Autocratic),
            other => Err(format!("direction must be 1 or -1, got {other}")),
        }
    }
}

impl From<Direction> for i8 {
    fn from(d: Direction) -> i8 {
        match d {
            Direction::Democratic => 1,
            Direction::Autocratic => -1,
        }
    }
}

/// One discrete political development.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventItem {
    pub id: String,
    pub date: DateTime<Utc>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub category: Category,
    pub direction: Direction,
    pub magnitude: f64,
    pub confidence: f64,
}

impl EventItem {
    /// direction × magnitude × confidence, before decay.
    pub fn raw_impact(&self) -> f64 {
        self.direction.sign() * self.magnitude * self.confidence
    }
}

/// Persisted/transport representation: `{ "events": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventsDocument {
    pub events: Vec<EventItem>,
}

impl EventsDocument {
    pub fn new(events: Vec<EventItem>) -> Self {
        Self { events }
    }

    /// Parse a document, dropping entries that fail validation one by one
    /// instead of rejecting the whole file. Result is sorted newest first.
    pub fn from_json_lenient(s: &str) -> anyhow::Result<Self> {
        #[derive(Deserialize)]
        struct Loose {
            #[serde(default)]
            events: serde_json::Value,
        }

        let loose: Loose = serde_json::from_str(s)?;
        let entries = match loose.events {
            serde_json::Value::Array(v) => v,
            _ => Vec::new(),
        };

        let mut events = validate_entries(entries);
        events.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(Self { events })
    }
}

/// Validate raw entries one by one, keeping arrival order. Invalid entries
/// are dropped and counted in the debug log.
pub fn validate_entries(entries: Vec<serde_json::Value>) -> Vec<EventItem> {
    let total = entries.len();
    let events: Vec<EventItem> = entries.into_iter().filter_map(validate_entry).collect();
    if events.len() < total {
        tracing::debug!(
            target: "store",
            total,
            kept = events.len(),
            "dropped invalid event entries"
        );
    }
    events
}

fn validate_entry(v: serde_json::Value) -> Option<EventItem> {
    let mut obj = match v {
        serde_json::Value::Object(m) => m,
        _ => return None,
    };

    // Optional strings of the wrong type are treated as absent rather than fatal.
    for key in ["summary", "url"] {
        if obj.get(key).is_some_and(|x| !x.is_string()) {
            obj.remove(key);
        }
    }
    if obj.get("title").and_then(|t| t.as_str()).is_none() {
        return None;
    }

    let ev: EventItem = serde_json::from_value(serde_json::Value::Object(obj)).ok()?;
    let valid = !ev.title.trim().is_empty()
        && ev.magnitude.is_finite()
        && ev.magnitude >= 0.0
        && (0.0..=1.0).contains(&ev.confidence);
    valid.then_some(ev)
}

/// Per-category score in (-100, 100).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryScores(BTreeMap<Category, f64>);

impl CategoryScores {
    /// All categories at zero.
    pub fn zeroed() -> Self {
        Self(Category::ALL.into_iter().map(|c| (c, 0.0)).collect())
    }

    pub fn get(&self, c: Category) -> f64 {
        self.0.get(&c).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, c: Category, value: f64) {
        self.0.insert(c, value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, f64)> + '_ {
        self.0.iter().map(|(c, v)| (*c, *v))
    }
}

impl Default for CategoryScores {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// Relative weight per category. Missing entries default to 1,
/// negative or non-finite entries are clamped to 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Category, f64>", into = "BTreeMap<Category, f64>")]
pub struct CategoryWeights(BTreeMap<Category, f64>);

pub const DEFAULT_WEIGHT: f64 = 1.0;

impl CategoryWeights {
    pub fn uniform(w: f64) -> Self {
        Self(
            Category::ALL
                .into_iter()
                .map(|c| (c, sanitize_weight(w)))
                .collect(),
        )
    }

    pub fn get(&self, c: Category) -> f64 {
        self.0.get(&c).copied().unwrap_or(DEFAULT_WEIGHT)
    }

    pub fn set(&mut self, c: Category, w: f64) {
        self.0.insert(c, sanitize_weight(w));
    }

    /// Builder-style variant of [`CategoryWeights::set`].
    pub fn with(mut self, c: Category, w: f64) -> Self {
        self.set(c, w);
        self
    }

    pub fn total(&self) -> f64 {
        Category::ALL.into_iter().map(|c| self.get(c)).sum()
    }
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self::uniform(DEFAULT_WEIGHT)
    }
}

impl From<BTreeMap<Category, f64>> for CategoryWeights {
    fn from(partial: BTreeMap<Category, f64>) -> Self {
        let mut out = Self::default();
        for (c, w) in partial {
            out.set(c, w);
        }
        out
    }
}

impl From<CategoryWeights> for BTreeMap<Category, f64> {
    fn from(w: CategoryWeights) -> Self {
        w.0
    }
}

fn sanitize_weight(w: f64) -> f64 {
    if w.is_finite() && w > 0.0 {
        w
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> EventItem {
        EventItem {
            id: "cl-1".into(),
            date: "2024-03-01T00:00:00Z".parse().unwrap(),
            title: "Court strikes law".into(),
            summary: None,
            url: Some("https://example.com".into()),
            category: Category::RightsAndLiberties,
            direction: Direction::Autocratic,
            magnitude: 2.0,
            confidence: 0.85,
        }
    }

    #[test]
    fn event_wire_field_names() {
        let v = serde_json::to_value(sample()).unwrap();
        assert_eq!(v["category"], "Rights & Liberties");
        assert_eq!(v["direction"], -1);
        assert_eq!(v["magnitude"], 2.0);
        assert!(v.get("summary").is_none(), "absent summary is omitted");
        assert_eq!(v["url"], "https://example.com");
    }

    #[test]
    fn direction_rejects_other_values() {
        let bad = json!({
            "id": "x", "date": "2024-01-01T00:00:00Z", "title": "t",
            "category": "Judicial", "direction": 0, "magnitude": 1.0, "confidence": 0.5
        });
        assert!(serde_json::from_value::<EventItem>(bad).is_err());
    }

    #[test]
    fn category_names_round_trip() {
        for c in Category::ALL {
            assert_eq!(Category::from_name(c.as_str()), Some(c));
            assert!(!c.description().is_empty());
        }
        assert_eq!(Category::from_name("judicial"), None);
    }

    #[test]
    fn lenient_document_drops_bad_entries_and_sorts() {
        let raw = json!({
            "events": [
                { "id": "a", "date": "2024-01-01T00:00:00Z", "title": "old",
                  "category": "Elections", "direction": 1, "magnitude": 2, "confidence": 0.9 },
                { "id": "b", "date": "2024-02-01T00:00:00Z", "title": "new",
                  "category": "Elections", "direction": -1, "magnitude": 2, "confidence": 0.9,
                  "url": 42 },
                { "id": "c", "date": "2024-02-01T00:00:00Z", "title": "bad dir",
                  "category": "Elections", "direction": 2, "magnitude": 2, "confidence": 0.9 },
                { "id": "d", "title": "no date",
                  "category": "Elections", "direction": 1, "magnitude": 2, "confidence": 0.9 },
                "not an object"
            ]
        });
        let doc = EventsDocument::from_json_lenient(&raw.to_string()).unwrap();
        let ids: Vec<_> = doc.events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(doc.events[0].url, None);
    }

    #[test]
    fn entries_breaking_value_ranges_are_dropped() {
        let entry = |id: &str, title: &str, magnitude: f64, confidence: f64| {
            json!({ "id": id, "date": "2024-01-01T00:00:00Z", "title": title,
                    "category": "Judicial", "direction": 1,
                    "magnitude": magnitude, "confidence": confidence })
        };
        let kept = validate_entries(vec![
            entry("ok", "Ruling", 0.0, 1.0),
            entry("empty-title", "  ", 2.0, 0.5),
            entry("neg-mag", "Ruling", -2.0, 0.5),
            entry("conf-high", "Ruling", 2.0, 1.5),
            entry("conf-neg", "Ruling", 2.0, -0.1),
            entry("last", "Ruling", 5.0, 0.0),
        ]);
        let ids: Vec<_> = kept.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["ok", "last"]);
    }

    #[test]
    fn lenient_document_without_events_array_is_empty() {
        let doc = EventsDocument::from_json_lenient(r#"{"events": null}"#).unwrap();
        assert!(doc.events.is_empty());
        assert!(EventsDocument::from_json_lenient("not json").is_err());
    }

    #[test]
    fn partial_weights_fill_defaults_and_clamp() {
        let w: CategoryWeights =
            serde_json::from_value(json!({ "Judicial": 3.0, "Elections": -2.0 })).unwrap();
        assert_eq!(w.get(Category::Judicial), 3.0);
        assert_eq!(w.get(Category::Elections), 0.0);
        assert_eq!(w.get(Category::CivilSociety), 1.0);
        assert!((w.total() - 8.0).abs() < 1e-12);
    }
}
