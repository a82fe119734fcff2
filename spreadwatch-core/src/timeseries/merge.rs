use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::types::{ComparisonRow, Decimal, MinuteSeries};

/// Decimal places kept in `percent_diff`.
pub const PERCENT_DP: u32 = 10;

/// Significant digits kept in every row value; an `f64` holds this many exactly, so
/// rows survive a JSON round trip unchanged.
pub const SIGNIFICANT_DIGITS: u32 = 15;

fn fit(d: Decimal) -> Decimal {
    d.round_sf(SIGNIFICANT_DIGITS).unwrap_or(d).normalize()
}

/// Build one comparison row from the two closes of a minute.
///
/// - `absolute_diff = b - a`, absent unless both closes are present.
/// - `percent_diff = absolute_diff / a * 100` rounded to [`PERCENT_DP`] places,
///   additionally absent when `a` is zero.
/// - Arithmetic overflow also yields absent diffs rather than an error.
/// - Values are capped at [`SIGNIFICANT_DIGITS`] and normalized.
#[must_use]
pub fn build_row(
    minute: DateTime<Utc>,
    source_a_close: Option<Decimal>,
    source_b_close: Option<Decimal>,
    now: DateTime<Utc>,
) -> ComparisonRow {
    let source_a_close = source_a_close.map(fit);
    let source_b_close = source_b_close.map(fit);
    let (absolute_diff, percent_diff) = match (source_a_close, source_b_close) {
        (Some(a), Some(b)) => {
            let abs = b.checked_sub(a).map(fit);
            let pct = if a.is_zero() {
                None
            } else {
                abs.and_then(|d| d.checked_div(a))
                    .and_then(|q| q.checked_mul(Decimal::ONE_HUNDRED))
                    .map(|p| fit(p.round_dp(PERCENT_DP)))
            };
            (abs, pct)
        }
        _ => (None, None),
    };
    ComparisonRow {
        minute,
        source_a_close,
        source_b_close,
        absolute_diff,
        percent_diff,
        last_updated: now,
    }
}

/// Outer-join two minute series into comparison rows.
///
/// - The output covers the union of minutes in `a` and `b`; a minute known to only
///   one side still yields a row with the other side's close absent.
/// - Every produced row is stamped with `now`.
/// - Rows are returned sorted ascending by minute.
#[must_use]
pub fn merge_minutes(a: &MinuteSeries, b: &MinuteSeries, now: DateTime<Utc>) -> Vec<ComparisonRow> {
    let minutes: BTreeSet<DateTime<Utc>> = a.keys().chain(b.keys()).copied().collect();
    minutes
        .into_iter()
        .map(|m| {
            let close_a = a.get(&m).copied().flatten();
            let close_b = b.get(&m).copied().flatten();
            build_row(m, close_a, close_b, now)
        })
        .collect()
}
