// src/ingest/mod.rs
pub mod classify;
pub mod config;
pub mod providers;
pub mod raw;
pub mod scheduler;
pub mod types;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use futures::future::join_all;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;

use crate::ingest::types::{SourceProvider, SourceReport};
use crate::merge::{merge_with_summary, MergeSummary};
use crate::model::EventItem;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "ingest_fetched_total",
            "Raw records fetched from providers."
        );
        describe_counter!(
            "ingest_events_total",
            "Events kept after normalization, per provider."
        );
        describe_counter!(
            "ingest_dropped_total",
            "Raw records dropped by normalization (no usable id or not an object)."
        );
        describe_counter!(
            "ingest_provider_errors_total",
            "Provider fetch/parse errors."
        );
        describe_counter!("ingest_runs_total", "Completed ingest passes.");
        describe_histogram!("ingest_fetch_ms", "Provider fetch time in milliseconds.");
        describe_gauge!(
            "ingest_pipeline_last_run_ts",
            "Unix ts when ingest pipeline last ran."
        );
    });
}

/// Normalize display text: decode entities, strip tags, fold quotes and whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 5) Length cap: 500 chars
    if out.chars().count() > 500 {
        out = out.chars().take(500).collect();
    }

    out
}

/// Parse a source timestamp into UTC. Missing or unparseable input yields
/// `now`, so one bad record never fails a batch.
///
/// Accepted: RFC 3339, `YYYY-MM-DDTHH:MM[:SS]Z`, `YYYY-MM-DD HH:MM[:SS]`,
/// `YYYY-MM-DD` (midnight UTC), GDELT `YYYYMMDDTHHMMSSZ`.
pub fn parse_timestamp(raw: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    let Some(s) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return now;
    };
    match try_parse_timestamp(s) {
        Some(dt) => dt,
        None => {
            tracing::debug!(target: "ingest", raw = s, "unparseable date, using now");
            now
        }
    }
}

fn try_parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    const NAIVE_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%SZ",
        "%Y-%m-%dT%H:%MZ",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y%m%dT%H%M%SZ",
    ];
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Result of one ingest pass.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    /// Merged collection, newest first.
    pub events: Vec<EventItem>,
    pub sources: Vec<SourceReport>,
    pub merge: MergeSummary,
}

/// Fetch every provider concurrently, normalize each batch, and merge the
/// union into `previous`. A failing provider contributes zero events.
pub async fn run_once(
    providers: &[Box<dyn SourceProvider>],
    previous: &[EventItem],
    now: DateTime<Utc>,
) -> IngestOutcome {
    ensure_metrics_described();

    let fetched = join_all(providers.iter().map(|p| p.fetch_raw())).await;

    let mut incoming = Vec::new();
    let mut reports = Vec::with_capacity(providers.len());
    for (p, res) in providers.iter().zip(fetched) {
        let name = p.name();
        let (records, failed) = match res {
            Ok(v) => (v, false),
            Err(e) => {
                tracing::warn!(target: "ingest", error = ?e, provider = name, "provider error");
                counter!("ingest_provider_errors_total").increment(1);
                (Vec::new(), true)
            }
        };

        let events = p.normalize(&records, now);
        let report = SourceReport {
            source: name.to_string(),
            fetched: records.len(),
            kept: events.len(),
            failed,
        };
        counter!("ingest_events_total", "provider" => name).increment(report.kept as u64);
        counter!("ingest_dropped_total", "provider" => name).increment(report.dropped() as u64);
        tracing::debug!(
            target: "ingest",
            provider = name,
            fetched = report.fetched,
            kept = report.kept,
            "provider normalized"
        );

        incoming.extend(events);
        reports.push(report);
    }

    // Arrival order: a later duplicate inside the batch must win. The merge sorts.
    let (events, merge) = merge_with_summary(previous, &incoming);

    counter!("ingest_runs_total").increment(1);
    gauge!("events_stored").set(events.len() as f64);
    gauge!("ingest_pipeline_last_run_ts").set(now.timestamp() as f64);

    tracing::info!(
        target: "ingest",
        incoming = merge.incoming,
        added = merge.added,
        total = merge.after,
        "ingest pass merged"
    );

    IngestOutcome {
        events,
        sources: reports,
        merge,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        "2025-05-05T05:05:05Z".parse().unwrap()
    }

    #[test]
    fn normalize_text_strips_markup_and_whitespace() {
        let s = "  <b>Court&nbsp;&nbsp;upholds</b>\n\t“fair maps”  ";
        assert_eq!(normalize_text(s), r#"Court upholds "fair maps""#);
    }

    #[test]
    fn normalize_text_keeps_trailing_abbreviations() {
        assert_eq!(normalize_text("Smith v. Acme Inc."), "Smith v. Acme Inc.");
    }

    #[test]
    fn timestamps_in_source_formats() {
        let expect = |s: &str| s.parse::<DateTime<Utc>>().unwrap();
        assert_eq!(
            parse_timestamp(Some("2024-06-01T10:00:00-04:00"), now()),
            expect("2024-06-01T14:00:00Z")
        );
        assert_eq!(
            parse_timestamp(Some("2024-06-01"), now()),
            expect("2024-06-01T00:00:00Z")
        );
        assert_eq!(
            parse_timestamp(Some("2024-06-01T09:15Z"), now()),
            expect("2024-06-01T09:15:00Z")
        );
        assert_eq!(
            parse_timestamp(Some("20240601T091500Z"), now()),
            expect("2024-06-01T09:15:00Z")
        );
        assert_eq!(
            parse_timestamp(Some("2024-06-01 09:15:00"), now()),
            expect("2024-06-01T09:15:00Z")
        );
    }

    #[test]
    fn bad_or_missing_timestamps_fall_back_to_now() {
        assert_eq!(parse_timestamp(None, now()), now());
        assert_eq!(parse_timestamp(Some(""), now()), now());
        assert_eq!(parse_timestamp(Some("yesterday-ish"), now()), now());
        assert_eq!(parse_timestamp(Some("2024-13-45"), now()), now());
    }
}
