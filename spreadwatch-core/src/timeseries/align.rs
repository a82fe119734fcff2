use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use chrono::{DateTime, Utc};

use crate::timeseries::util::floor_to_minute;
use crate::types::{Candle, Decimal, MinuteSeries};

/// Collapse raw candles into one close per minute.
///
/// - Each candle's open time is truncated to its minute.
/// - When several candles land in the same minute, the one with the latest original
///   timestamp wins; on identical timestamps the later one in input order wins.
/// - Empty input yields an empty series.
pub fn align_to_minutes<I>(candles: I) -> MinuteSeries
where
    I: IntoIterator<Item = Candle>,
{
    let mut latest: BTreeMap<DateTime<Utc>, (DateTime<Utc>, Option<Decimal>)> = BTreeMap::new();
    for c in candles {
        match latest.entry(floor_to_minute(c.ts)) {
            Entry::Vacant(v) => {
                v.insert((c.ts, c.close));
            }
            Entry::Occupied(mut o) => {
                if c.ts >= o.get().0 {
                    o.insert((c.ts, c.close));
                }
            }
        }
    }
    latest
        .into_iter()
        .map(|(minute, (_, close))| (minute, close))
        .collect()
}
