use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use spreadwatch_core::{MinuteSeries, build_row, merge_minutes};
use std::collections::BTreeSet;

fn minute(m: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000 / 60 * 60 + m * 60, 0).unwrap()
}

fn arb_close() -> impl Strategy<Value = Option<Decimal>> {
    prop_oneof![
        1 => Just(None),
        1 => Just(Some(Decimal::ZERO)),
        8 => (1i64..10_000_000i64).prop_map(|c| Some(Decimal::new(c, 2))),
    ]
}

fn arb_series() -> impl Strategy<Value = MinuteSeries> {
    proptest::collection::btree_map((0i64..500i64).prop_map(minute), arb_close(), 0..120)
}

proptest! {
    #[test]
    fn keys_are_the_union(a in arb_series(), b in arb_series()) {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let rows = merge_minutes(&a, &b, now);

        let expected: BTreeSet<_> = a.keys().chain(b.keys()).copied().collect();
        let got: Vec<_> = rows.iter().map(|r| r.minute).collect();
        prop_assert_eq!(got, expected.into_iter().collect::<Vec<_>>());

        for r in &rows {
            prop_assert_eq!(r.source_a_close, a.get(&r.minute).copied().flatten());
            prop_assert_eq!(r.source_b_close, b.get(&r.minute).copied().flatten());
            prop_assert_eq!(r.last_updated, now);
        }
    }

    #[test]
    fn diffs_absent_unless_both_sides_present(a in arb_close(), b in arb_close()) {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let row = build_row(minute(0), a, b, now);
        match (a, b) {
            (Some(x), Some(y)) => {
                prop_assert_eq!(row.absolute_diff, Some(y - x));
                if x.is_zero() {
                    prop_assert!(row.percent_diff.is_none());
                } else {
                    prop_assert!(row.percent_diff.is_some());
                }
            }
            _ => {
                prop_assert!(row.absolute_diff.is_none());
                prop_assert!(row.percent_diff.is_none());
            }
        }
    }

    #[test]
    fn merge_is_symmetric_in_key_coverage(a in arb_series(), b in arb_series()) {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let ab = merge_minutes(&a, &b, now);
        let ba = merge_minutes(&b, &a, now);
        prop_assert_eq!(ab.len(), ba.len());
        for (x, y) in ab.iter().zip(ba.iter()) {
            prop_assert_eq!(x.minute, y.minute);
            prop_assert_eq!(x.source_a_close, y.source_b_close);
        }
    }
}
