use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::types::ComparisonRow;

/// Overlay freshly merged rows onto the previous dataset and keep the newest
/// `window_size` minutes.
///
/// - Rows are keyed by minute. `previous` is inserted first, then `incoming`; an
///   incoming row replaces the previous row for its minute entirely, including
///   `last_updated`.
/// - Minutes only present in `previous` are carried over unchanged.
/// - The result is sorted ascending and truncated from the oldest end, so
///   `window_size` caps the row count, not the covered time span.
/// - Duplicate minutes within a single input resolve to the last occurrence.
///
/// Reconciling the output again with the same or an empty `incoming` batch is a
/// no-op.
#[must_use]
pub fn reconcile<P, I>(previous: P, incoming: I, window_size: usize) -> Vec<ComparisonRow>
where
    P: IntoIterator<Item = ComparisonRow>,
    I: IntoIterator<Item = ComparisonRow>,
{
    let mut by_minute: BTreeMap<DateTime<Utc>, ComparisonRow> = BTreeMap::new();
    for row in previous.into_iter().chain(incoming) {
        by_minute.insert(row.minute, row);
    }
    let evict = by_minute.len().saturating_sub(window_size);
    by_minute.into_values().skip(evict).collect()
}
