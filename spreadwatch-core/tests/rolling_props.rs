use chrono::{DateTime, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use spreadwatch_core::{ComparisonRow, build_row, reconcile};
use std::collections::BTreeMap;

fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

fn arb_row(stamp: i64) -> impl Strategy<Value = ComparisonRow> {
    (0i64..400i64, proptest::option::of(1i64..1_000_000i64), proptest::option::of(1i64..1_000_000i64))
        .prop_map(move |(m, a, b)| {
            build_row(
                ts(1_699_999_980 + m * 60),
                a.map(|c| Decimal::new(c, 1)),
                b.map(|c| Decimal::new(c, 1)),
                ts(stamp),
            )
        })
}

fn arb_rows(stamp: i64) -> impl Strategy<Value = Vec<ComparisonRow>> {
    proptest::collection::vec(arb_row(stamp), 0..150)
}

fn is_strictly_ascending(rows: &[ComparisonRow]) -> bool {
    rows.windows(2).all(|w| w[0].minute < w[1].minute)
}

proptest! {
    #[test]
    fn reconcile_is_idempotent(p in arb_rows(1), i in arb_rows(2), n in 0usize..200) {
        let once = reconcile(p, i, n);
        let twice = reconcile(once.clone(), Vec::new(), n);
        prop_assert_eq!(&twice, &once);
        let replayed = reconcile(once.clone(), once.clone(), n);
        prop_assert_eq!(replayed, once);
    }

    #[test]
    fn window_keeps_the_n_most_recent(p in arb_rows(1), i in arb_rows(2), n in 0usize..200) {
        let out = reconcile(p.clone(), i.clone(), n);
        prop_assert!(out.len() <= n);
        prop_assert!(is_strictly_ascending(&out));

        // Model: last writer wins per minute, previous first then incoming.
        let mut model: BTreeMap<DateTime<Utc>, ComparisonRow> = BTreeMap::new();
        for r in p.into_iter().chain(i) {
            model.insert(r.minute, r);
        }
        let expected: Vec<ComparisonRow> = model.into_values().rev().take(n).rev().collect();
        prop_assert_eq!(out, expected);
    }

    #[test]
    fn incoming_overrides_previous_on_shared_minutes(p in arb_rows(1), i in arb_rows(2)) {
        let out = reconcile(p.clone(), i.clone(), usize::MAX);
        let incoming: BTreeMap<_, _> = i.into_iter().map(|r| (r.minute, r)).collect();
        let previous: BTreeMap<_, _> = p.into_iter().map(|r| (r.minute, r)).collect();
        for r in &out {
            if let Some(fresh) = incoming.get(&r.minute) {
                prop_assert_eq!(r, fresh);
            } else {
                prop_assert_eq!(Some(r), previous.get(&r.minute));
            }
        }
    }
}
