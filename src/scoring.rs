//! # Scoring
//! Pure, testable logic that folds events into per-category scores and a
//! single weighted index. No I/O and no hidden clock: every function takes
//! `now` explicitly so results are reproducible.
//!
//! Per event: `impact = direction * magnitude * confidence * e^(-λ·age_days)`
//! with λ = ln 2 / 365. Per category: `score = tanh(Σ impact / 10) * 100`.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::model::{Category, CategoryScores, CategoryWeights, EventItem};

/// Days after which an event contributes half its original weight.
pub const HALF_LIFE_DAYS: f64 = 365.0;

/// Divisor applied to the raw accumulator before `tanh`.
pub const SATURATION_SCALE: f64 = 10.0;

const MS_PER_DAY: f64 = 24.0 * 3600.0 * 1000.0;

/// Decay multiplier for an event `age_days` old. Negative ages count as 0.
pub fn decay_factor(age_days: f64) -> f64 {
    let lambda = std::f64::consts::LN_2 / HALF_LIFE_DAYS;
    (-lambda * age_days.max(0.0)).exp()
}

/// Age in fractional days, clamped at 0 for future-dated events.
pub fn age_days(date: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let ms = (now - date).num_milliseconds() as f64;
    (ms / MS_PER_DAY).max(0.0)
}

/// Decayed contribution of a single event at `now`.
pub fn signed_impact(ev: &EventItem, now: DateTime<Utc>) -> f64 {
    ev.raw_impact() * decay_factor(age_days(ev.date, now))
}

/// Unbounded per-category accumulators (before saturation).
pub fn raw_category_sums(events: &[EventItem], now: DateTime<Utc>) -> CategoryScores {
    let mut sums = CategoryScores::zeroed();
    for ev in events {
        let acc = sums.get(ev.category) + signed_impact(ev, now);
        sums.set(ev.category, acc);
    }
    sums
}

/// One score per category in (-100, 100). Empty input scores 0 everywhere.
pub fn score_categories(events: &[EventItem], now: DateTime<Utc>) -> CategoryScores {
    let sums = raw_category_sums(events, now);
    let mut out = CategoryScores::zeroed();
    for c in Category::ALL {
        out.set(c, saturate(sums.get(c)));
    }
    out
}

fn saturate(raw: f64) -> f64 {
    let s = (raw / SATURATION_SCALE).tanh() * 100.0;
    // tanh reaches ±1.0 in f64 for large inputs; keep the open interval.
    s.clamp(-MAX_SCORE, MAX_SCORE)
}

/// Largest f64 strictly below 100.
const MAX_SCORE: f64 = 99.999_999_999_999_986;

/// Weighted mean of category scores. Zero total weight divides by 1 (→ 0).
///
/// Weights are rescaled by the largest one first, so huge finite weights
/// cannot overflow the total.
pub fn weighted_index(scores: &CategoryScores, weights: &CategoryWeights) -> f64 {
    let max_w = Category::ALL
        .into_iter()
        .map(|c| weights.get(c))
        .fold(0.0_f64, f64::max);
    if max_w == 0.0 {
        return 0.0;
    }
    let unit = |c: Category| weights.get(c) / max_w;

    let total: f64 = Category::ALL.into_iter().map(unit).sum();
    let divisor = if total == 0.0 { 1.0 } else { total };
    let sum: f64 = Category::ALL
        .into_iter()
        .map(|c| scores.get(c) * unit(c))
        .sum();
    sum / divisor
}

/// Summary counters for the dashboard header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventStats {
    pub total: usize,
    pub positive: usize,
    pub negative: usize,
    pub net_impact: f64,
    pub average_confidence: f64,
    pub latest_event_date: Option<DateTime<Utc>>,
}

/// Undecayed totals over the whole collection.
pub fn event_stats(events: &[EventItem]) -> EventStats {
    if events.is_empty() {
        return EventStats {
            total: 0,
            positive: 0,
            negative: 0,
            net_impact: 0.0,
            average_confidence: 0.0,
            latest_event_date: None,
        };
    }

    let positive = events.iter().filter(|e| e.direction.sign() > 0.0).count();
    let net_impact = events.iter().map(EventItem::raw_impact).sum();
    let confidence_sum: f64 = events.iter().map(|e| e.confidence).sum();
    let latest_event_date = events.iter().map(|e| e.date).max();

    EventStats {
        total: events.len(),
        positive,
        negative: events.len() - positive,
        net_impact,
        average_confidence: confidence_sum / events.len() as f64,
        latest_event_date,
    }
}

/// A point on the index history chart; `ts` is Unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreHistoryPoint {
    pub ts: i64,
    pub value: f64,
}

/// Reconstruct the index at `points` evenly spaced instants over the last
/// `span_days`, ending at `now`. Each instant only sees events dated at or
/// before it.
pub fn index_series(
    events: &[EventItem],
    weights: &CategoryWeights,
    now: DateTime<Utc>,
    span_days: u32,
    points: usize,
) -> Vec<ScoreHistoryPoint> {
    if points == 0 {
        return Vec::new();
    }

    let span_ms = i64::from(span_days) * 24 * 3600 * 1000;
    let start = now - Duration::milliseconds(span_ms);
    let step_ms = if points > 1 {
        span_ms / (points as i64 - 1)
    } else {
        0
    };

    (0..points)
        .map(|i| {
            // Last point is pinned to `now` so integer step rounding never drifts.
            let t = if i + 1 == points {
                now
            } else {
                start + Duration::milliseconds(step_ms * i as i64)
            };
            let visible: Vec<EventItem> =
                events.iter().filter(|e| e.date <= t).cloned().collect();
            let scores = score_categories(&visible, t);
            ScoreHistoryPoint {
                ts: t.timestamp_millis(),
                value: weighted_index(&scores, weights),
            }
        })
        .collect()
}
