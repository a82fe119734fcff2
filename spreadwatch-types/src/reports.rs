//! Report envelopes produced by the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SpreadError;

/// Outcome of fetching one source during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReport {
    /// Connector name.
    pub name: String,
    /// Distinct minutes contributed by this source after alignment and clipping.
    pub minutes: usize,
    /// Failure that degraded this source to absent data, if any.
    pub error: Option<SpreadError>,
}

impl SourceReport {
    /// True when the source contributed nothing because its fetch failed.
    #[must_use]
    pub const fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Summary of one completed run.
///
/// A report is only produced once the dataset has been durably written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Instant the run was stamped with (`updated_at_utc` of refreshed rows).
    pub updated_at: DateTime<Utc>,
    /// Number of rows in the persisted dataset.
    pub rows_written: usize,
    /// Rows produced by this run's merge before reconciliation.
    pub rows_refreshed: usize,
    /// Oldest minute retained, if the dataset is non-empty.
    pub first_ts: Option<DateTime<Utc>>,
    /// Newest minute retained, if the dataset is non-empty.
    pub last_ts: Option<DateTime<Utc>>,
    /// Per-source outcomes in source order (A, then B).
    pub sources: Vec<SourceReport>,
}

impl RunReport {
    /// Non-fatal issues encountered while building the report.
    pub fn warnings(&self) -> impl Iterator<Item = &SpreadError> {
        self.sources.iter().filter_map(|s| s.error.as_ref())
    }

    /// True when every source failed this run.
    #[must_use]
    pub fn all_sources_failed(&self) -> bool {
        !self.sources.is_empty() && self.sources.iter().all(SourceReport::failed)
    }
}
