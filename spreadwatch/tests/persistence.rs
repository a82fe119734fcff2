use std::str::FromStr;

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use spreadwatch::{CSV_HEADER, DatasetStore, FileStore, OutputConfig};
use spreadwatch_core::build_row;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn store_in(dir: &std::path::Path) -> FileStore {
    FileStore::new(OutputConfig {
        dir: dir.join("nested").join("data"),
        stem: "btc_reya_vs_binance_1m".to_string(),
    })
}

fn sample_rows() -> Vec<spreadwatch::ComparisonRow> {
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 5, 3).unwrap();
    vec![
        build_row(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 3, 0).unwrap(),
            Some(dec("60000.10")),
            None,
            now,
        ),
        build_row(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 4, 0).unwrap(),
            Some(dec("60000")),
            Some(dec("60030")),
            now,
        ),
    ]
}

#[test]
fn missing_dataset_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    assert!(store_in(dir.path()).load().unwrap().is_empty());
}

#[test]
fn csv_layout() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(dir.path());
    store.save(&sample_rows()).unwrap();

    let text = std::fs::read_to_string(store.csv_path()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], CSV_HEADER.join(","));
    assert_eq!(
        lines[0],
        "ts_utc,source_a_close,source_b_close,abs_diff,diff_pct,updated_at_utc"
    );
    assert_eq!(lines[1], "2024-05-01 12:03:00Z,60000.1,,,,2024-05-01 12:05:03Z");
    assert_eq!(
        lines[2],
        "2024-05-01 12:04:00Z,60000,60030,30,0.05,2024-05-01 12:05:03Z"
    );
    assert_eq!(lines.len(), 3);
}

#[test]
fn json_layout_and_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(dir.path());
    store.save(&sample_rows()).unwrap();

    let text = std::fs::read_to_string(store.json_path()).unwrap();
    assert!(text.ends_with("]\n"));
    let v: serde_json::Value = serde_json::from_str(&text).unwrap();
    let first = &v[0];
    assert_eq!(first["ts_utc"], "2024-05-01 12:03:00Z");
    assert_eq!(first["source_a_close"], 60000.1);
    assert!(first["source_b_close"].is_null());
    assert!(first["abs_diff"].is_null());
    assert!(first["diff_pct"].is_null());
    assert_eq!(first["updated_at_utc"], "2024-05-01 12:05:03Z");
    assert_eq!(v[1]["diff_pct"], 0.05);

    assert_eq!(store.load().unwrap(), sample_rows());
}

#[test]
fn untouched_rows_survive_reload_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(dir.path());
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 5, 3).unwrap();
    let rows = vec![build_row(
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 4, 0).unwrap(),
        Some(dec("60000.12")),
        Some(dec("60017.35")),
        now,
    )];
    assert_eq!(rows[0].percent_diff, Some(dec("0.0287166092")));

    store.save(&rows).unwrap();
    let csv_before = std::fs::read_to_string(store.csv_path()).unwrap();
    let json_before = std::fs::read_to_string(store.json_path()).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded, rows);
    store.save(&loaded).unwrap();

    assert_eq!(std::fs::read_to_string(store.csv_path()).unwrap(), csv_before);
    assert_eq!(std::fs::read_to_string(store.json_path()).unwrap(), json_before);
    assert!(csv_before.contains(",60000.12,60017.35,17.23,0.0287166092,"));
}

#[test]
fn failed_save_leaves_both_outputs_from_the_same_run() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(dir.path());
    store.save(&sample_rows()).unwrap();
    let csv_before = std::fs::read_to_string(store.csv_path()).unwrap();

    // A directory at the JSON path makes its replacement fail.
    std::fs::remove_file(store.json_path()).unwrap();
    std::fs::create_dir(store.json_path()).unwrap();
    std::fs::write(store.json_path().join("keep"), "x").unwrap();

    let err = store.save(&sample_rows()[..1]).unwrap_err();
    assert!(matches!(err, spreadwatch::SpreadError::Persistence(_)));
    assert_eq!(std::fs::read_to_string(store.csv_path()).unwrap(), csv_before);

    let names: Vec<String> = std::fs::read_dir(dir.path().join("nested").join("data"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 2, "temporary files left behind: {names:?}");
}

#[test]
fn save_replaces_previous_content_without_leftovers() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(dir.path());
    store.save(&sample_rows()).unwrap();
    store.save(&sample_rows()[..1]).unwrap();

    assert_eq!(store.load().unwrap().len(), 1);
    let mut names: Vec<String> = std::fs::read_dir(dir.path().join("nested").join("data"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec!["btc_reya_vs_binance_1m.csv", "btc_reya_vs_binance_1m.json"]
    );
}

#[test]
fn empty_dataset_writes_header_and_empty_array() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(dir.path());
    store.save(&[]).unwrap();
    assert_eq!(
        std::fs::read_to_string(store.csv_path()).unwrap().trim_end(),
        CSV_HEADER.join(",")
    );
    assert_eq!(std::fs::read_to_string(store.json_path()).unwrap(), "[]\n");
}

#[test]
fn unparseable_json_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(dir.path());
    std::fs::create_dir_all(dir.path().join("nested").join("data")).unwrap();
    std::fs::write(store.json_path(), "[{\"ts_utc\": \"yesterday\"}]").unwrap();
    assert!(store.load().unwrap().is_empty());
}

#[test]
fn unwritable_directory_is_a_persistence_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, "x").unwrap();
    let store = FileStore::new(OutputConfig {
        dir: blocker.join("sub"),
        stem: "s".to_string(),
    });
    let err = store.save(&sample_rows()).unwrap_err();
    assert!(matches!(err, spreadwatch::SpreadError::Persistence(_)));
}
