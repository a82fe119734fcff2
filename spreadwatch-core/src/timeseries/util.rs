//! Shared helpers for minute boundaries.

use chrono::{DateTime, Duration, TimeDelta, Utc};

use crate::types::MinuteSeries;

/// Milliseconds per minute.
pub const MINUTE_MS: i64 = 60_000;

/// Truncate `ts` to the start of its minute (toward the past for pre-epoch instants).
#[must_use]
pub fn floor_to_minute(ts: DateTime<Utc>) -> DateTime<Utc> {
    let floored = ts.timestamp_millis().div_euclid(MINUTE_MS) * MINUTE_MS;
    DateTime::from_timestamp_millis(floored).unwrap_or(ts)
}

/// Inclusive range of completed minutes covered by one run.
///
/// For a run at `now`, the still-open minute `floor(now)` is excluded: `latest` is
/// the minute before it and `first` lies `rows - 1` minutes earlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinuteRange {
    /// Oldest minute of the window.
    pub first: DateTime<Utc>,
    /// Newest completed minute.
    pub latest: DateTime<Utc>,
    /// Start of the current (open) minute; requests end here.
    pub end: DateTime<Utc>,
}

impl MinuteRange {
    /// Window of `rows` completed minutes ending just before `now`'s minute.
    ///
    /// `rows == 0` is treated as a single-minute window.
    #[must_use]
    pub fn ending_before(now: DateTime<Utc>, rows: usize) -> Self {
        let end = floor_to_minute(now);
        let latest = end - Duration::minutes(1);
        let first = i64::try_from(rows.max(1) - 1)
            .ok()
            .and_then(TimeDelta::try_minutes)
            .and_then(|span| latest.checked_sub_signed(span))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self { first, latest, end }
    }

    /// True if `minute` lies within `[first, latest]`.
    #[must_use]
    pub fn contains(&self, minute: DateTime<Utc>) -> bool {
        self.first <= minute && minute <= self.latest
    }

    /// Drop every entry outside `[first, latest]`.
    #[must_use]
    pub fn clip(&self, mut series: MinuteSeries) -> MinuteSeries {
        series.retain(|minute, _| self.contains(*minute));
        series
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn floor_discards_seconds_and_subseconds() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 3, 55).unwrap()
            + Duration::milliseconds(999);
        assert_eq!(
            floor_to_minute(ts),
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 3, 0).unwrap()
        );
    }

    #[test]
    fn range_excludes_open_minute() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 3, 20).unwrap();
        let r = MinuteRange::ending_before(now, 3);
        assert_eq!(r.end, Utc.with_ymd_and_hms(2024, 5, 1, 12, 3, 0).unwrap());
        assert_eq!(r.latest, Utc.with_ymd_and_hms(2024, 5, 1, 12, 2, 0).unwrap());
        assert_eq!(r.first, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        assert!(!r.contains(r.end));
        assert!(r.contains(r.first));
    }
}
