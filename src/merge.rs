//! # Merge
//! Combines a previous event collection with a freshly normalized one.
//!
//! Two steps, always in this order:
//! 1. key by `id`, seeded with `previous`, then overwritten by `incoming`
//!    in arrival order (latest wins);
//! 2. sort newest first (stable, so equal dates keep insertion order).
//!
//! Because the second writer wins, merging is order-sensitive when two
//! batches touch the same id: callers must merge in real arrival order.

use std::collections::HashMap;

use crate::model::EventItem;

/// Deduplicate by id (latest wins) and sort by date descending.
pub fn merge(previous: &[EventItem], incoming: &[EventItem]) -> Vec<EventItem> {
    let mut slots: Vec<EventItem> = Vec::with_capacity(previous.len() + incoming.len());
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(slots.capacity());

    for ev in previous.iter().chain(incoming.iter()) {
        match index.get(ev.id.as_str()) {
            Some(&i) => slots[i] = ev.clone(),
            None => {
                index.insert(ev.id.as_str(), slots.len());
                slots.push(ev.clone());
            }
        }
    }

    slots.sort_by(|a, b| b.date.cmp(&a.date));
    slots
}

/// Counts describing what a merge did, for logs and the refresh endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MergeSummary {
    pub before: usize,
    pub incoming: usize,
    pub after: usize,
    /// Incoming ids that were not present before.
    pub added: usize,
}

/// [`merge`] plus a summary of the size change.
pub fn merge_with_summary(
    previous: &[EventItem],
    incoming: &[EventItem],
) -> (Vec<EventItem>, MergeSummary) {
    let merged = merge(previous, incoming);
    let summary = MergeSummary {
        before: previous.len(),
        incoming: incoming.len(),
        after: merged.len(),
        added: merged.len().saturating_sub(distinct_ids(previous)),
    };
    (merged, summary)
}

fn distinct_ids(events: &[EventItem]) -> usize {
    events
        .iter()
        .map(|e| e.id.as_str())
        .collect::<std::collections::HashSet<_>>()
        .len()
}
