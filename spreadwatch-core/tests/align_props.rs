use chrono::{DateTime, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use spreadwatch_core::{Candle, align_to_minutes, floor_to_minute};
use std::collections::BTreeMap;

fn arb_candle() -> impl Strategy<Value = Candle> {
    // Broaden to include pre-epoch and sub-second timestamps
    (-2_000_000_000_000i64..2_000_000_000_000i64, proptest::option::of(0i64..1_000_000i64))
        .prop_map(|(ms, c)| {
            Candle::new(
                DateTime::from_timestamp_millis(ms).unwrap(),
                c.map(|v| Decimal::new(v, 2)),
            )
        })
}

proptest! {
    #[test]
    fn keys_are_minute_aligned(candles in proptest::collection::vec(arb_candle(), 0..200)) {
        let aligned = align_to_minutes(candles.clone());
        for m in aligned.keys() {
            prop_assert_eq!(m.timestamp_millis().rem_euclid(60_000), 0);
        }
        let distinct: std::collections::BTreeSet<_> =
            candles.iter().map(|c| floor_to_minute(c.ts)).collect();
        prop_assert_eq!(aligned.len(), distinct.len());
    }

    #[test]
    fn latest_original_timestamp_wins(candles in proptest::collection::vec(arb_candle(), 0..200)) {
        let aligned = align_to_minutes(candles.clone());
        let mut model: BTreeMap<DateTime<Utc>, &Candle> = BTreeMap::new();
        for c in &candles {
            let m = floor_to_minute(c.ts);
            match model.get(&m) {
                Some(prev) if prev.ts > c.ts => {}
                _ => {
                    model.insert(m, c);
                }
            }
        }
        for (m, c) in model {
            prop_assert_eq!(aligned.get(&m).copied().flatten(), c.close);
        }
    }
}
