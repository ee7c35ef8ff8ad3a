// tests/ingest_pipeline.rs
//
// Full pass over fixture-backed providers: concurrent fetch, failure
// isolation, merge with the previous collection, and idempotent re-ingest.

use chrono::{DateTime, Duration, Utc};
use democracy_index::ingest::providers::{
    courtlistener::CourtListenerProvider, gdelt::GdeltProvider, openstates::OpenStatesProvider,
    propublica::ProPublicaProvider,
};
use democracy_index::ingest::run_once;
use democracy_index::ingest::types::SourceProvider;
use democracy_index::model::{Category, Direction, EventItem};

const PROPUBLICA: &str = include_str!("fixtures/propublica_votes.json");
const OPENSTATES: &str = include_str!("fixtures/openstates_bills.json");
const COURTLISTENER: &str = include_str!("fixtures/courtlistener_opinions.json");
const GDELT: &str = include_str!("fixtures/gdelt_articles.json");

fn now() -> DateTime<Utc> {
    "2024-09-15T00:00:00Z".parse().unwrap()
}

fn all_providers() -> Vec<Box<dyn SourceProvider>> {
    vec![
        Box::new(ProPublicaProvider::from_fixture_default(PROPUBLICA).unwrap()),
        Box::new(OpenStatesProvider::from_fixture_default(OPENSTATES).unwrap()),
        Box::new(CourtListenerProvider::from_fixture_default(COURTLISTENER).unwrap()),
        Box::new(GdeltProvider::from_fixture_default(GDELT).unwrap()),
    ]
}

fn assert_newest_first(events: &[EventItem]) {
    for w in events.windows(2) {
        assert!(w[0].date >= w[1].date, "{} before {}", w[0].id, w[1].id);
    }
}

#[tokio::test]
async fn fixtures_ingest_into_empty_collection() {
    let out = run_once(&all_providers(), &[], now()).await;

    assert_eq!(out.events.len(), 8);
    assert_eq!(out.merge.before, 0);
    assert_eq!(out.merge.added, 8);
    assert_newest_first(&out.events);

    let names: Vec<_> = out.sources.iter().map(|s| s.source.as_str()).collect();
    assert_eq!(names.len(), 4);
    assert!(out.sources.iter().all(|s| !s.failed));
    assert!(out.sources.iter().all(|s| s.kept == 2));
}

#[tokio::test]
async fn reingesting_same_payloads_is_idempotent() {
    let first = run_once(&all_providers(), &[], now()).await;
    let second = run_once(&all_providers(), &first.events, now()).await;

    assert_eq!(second.events.len(), first.events.len());
    assert_eq!(second.merge.added, 0);
    let ids = |v: &[EventItem]| v.iter().map(|e| e.id.clone()).collect::<Vec<_>>();
    assert_eq!(ids(&second.events), ids(&first.events));
}

#[tokio::test]
async fn failing_provider_does_not_abort_the_pass() {
    let providers: Vec<Box<dyn SourceProvider>> = vec![
        Box::new(CourtListenerProvider::from_fixture_default("not json").unwrap()),
        Box::new(GdeltProvider::from_fixture_default(GDELT).unwrap()),
    ];
    let out = run_once(&providers, &[], now()).await;

    assert_eq!(out.events.len(), 2);
    assert!(out.events.iter().all(|e| e.id.starts_with("gd-")));

    let failed: Vec<_> = out.sources.iter().filter(|s| s.failed).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].kept, 0);
}

#[tokio::test]
async fn every_provider_failing_keeps_previous_collection() {
    let previous = vec![EventItem {
        id: "seed-1".into(),
        date: now() - Duration::days(3),
        title: "Existing".into(),
        summary: None,
        url: None,
        category: Category::Judicial,
        direction: Direction::Democratic,
        magnitude: 1.0,
        confidence: 1.0,
    }];
    let providers: Vec<Box<dyn SourceProvider>> = vec![
        Box::new(OpenStatesProvider::from_fixture_default("{").unwrap()),
        Box::new(GdeltProvider::from_fixture_default("").unwrap()),
    ];
    let out = run_once(&providers, &previous, now()).await;

    assert_eq!(out.events, previous);
    assert_eq!(out.merge.added, 0);
    assert!(out.sources.iter().all(|s| s.failed));
}

#[tokio::test]
async fn fresh_record_replaces_stored_one_with_same_id() {
    let mut stale = run_once(&all_providers(), &[], now()).await.events;
    let target = stale
        .iter_mut()
        .find(|e| e.id == "cl-9876543")
        .expect("opinion ingested");
    target.title = "Outdated title".into();
    target.direction = Direction::Autocratic;

    let out = run_once(&all_providers(), &stale, now()).await;
    let refreshed = out.events.iter().find(|e| e.id == "cl-9876543").unwrap();
    assert_ne!(refreshed.title, "Outdated title");
    assert_eq!(refreshed.direction, Direction::Democratic);
    assert_eq!(out.events.len(), 8);
}

#[tokio::test]
async fn later_duplicate_in_one_batch_wins_regardless_of_date() {
    let payload = r#"{ "articles": [
        { "url": "https://x.example/a", "title": "Rally draws crowd", "seendate": "20250301T000000Z" },
        { "url": "https://x.example/b", "title": "Other story", "seendate": "20250201T000000Z" },
        { "url": "https://x.example/a", "title": "Rally draws crowd (corrected)", "seendate": "20250101T000000Z" }
    ] }"#;
    let providers: Vec<Box<dyn SourceProvider>> =
        vec![Box::new(GdeltProvider::from_fixture_default(payload).unwrap())];
    let out = run_once(&providers, &[], now()).await;

    assert_eq!(out.events.len(), 2);
    let a = out
        .events
        .iter()
        .find(|e| e.id == "gd-https://x.example/a")
        .unwrap();
    assert_eq!(a.title, "Rally draws crowd (corrected)");
    assert_eq!(a.date, "2025-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap());
    assert_newest_first(&out.events);
}
