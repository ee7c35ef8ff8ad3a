//! Demo dataset shown when no ingested data exists yet.

use chrono::{DateTime, Duration, Utc};

use crate::model::{Category, Direction, EventItem};

/// Three hand-written events dated 3 days, 1 day and 0 days before `now`.
pub fn seed_events(now: DateTime<Utc>) -> Vec<EventItem> {
    vec![
        EventItem {
            id: "seed-1".into(),
            date: now - Duration::days(3),
            title: "Court curtails gerrymandered map".into(),
            summary: None,
            url: None,
            category: Category::Elections,
            direction: Direction::Democratic,
            magnitude: 2.5,
            confidence: 0.9,
        },
        EventItem {
            id: "seed-2".into(),
            date: now - Duration::days(1),
            title: "Legislature advances voter ID expansion".into(),
            summary: None,
            url: None,
            category: Category::Elections,
            direction: Direction::Autocratic,
            magnitude: 2.0,
            confidence: 0.8,
        },
        EventItem {
            id: "seed-3".into(),
            date: now,
            title: "Peaceful mass protest for press freedom".into(),
            summary: None,
            url: None,
            category: Category::CivilSociety,
            direction: Direction::Democratic,
            magnitude: 1.2,
            confidence: 0.7,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_are_valid_and_serialize_iso_dates() {
        let now: DateTime<Utc> = "2025-01-01T00:00:00Z".parse().unwrap();
        let events = seed_events(now);
        assert_eq!(events.len(), 3);
        for e in &events {
            assert!(!e.id.is_empty() && !e.title.is_empty());
            assert!((0.0..=1.0).contains(&e.confidence));
            let v = serde_json::to_value(e).unwrap();
            let date = v["date"].as_str().unwrap();
            assert!(chrono::DateTime::parse_from_rfc3339(date).is_ok());
        }
    }
}
