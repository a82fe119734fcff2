use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use spreadwatch_core::{Candle, CandleRequest, CandleSource, SpreadError};
use spreadwatch_mock::{DynamicMockSource, MockBehavior, MockSource};

fn req(symbol: &str) -> CandleRequest {
    CandleRequest {
        symbol: symbol.to_string(),
        resolution: "1m".to_string(),
        start: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        end: Utc.with_ymd_and_hms(2024, 5, 1, 12, 9, 0).unwrap(),
        limit: 1500,
    }
}

#[tokio::test]
async fn static_fixtures_cover_the_range_inclusively() {
    let src = MockSource::new();
    let candles = src.fetch(&req("BTCUSDT")).await.unwrap();
    assert_eq!(candles.len(), 10);
    assert_eq!(candles[0].ts, req("x").start);
    assert_eq!(candles[9].ts, req("x").end);
    assert!(candles.iter().all(|c| c.close.is_some()));

    let again = src.fetch(&req("BTCUSDT")).await.unwrap();
    assert_eq!(candles, again);
}

#[tokio::test]
async fn static_fixtures_respect_limit() {
    let mut r = req("BTCUSDT");
    r.limit = 3;
    let candles = MockSource::new().fetch(&r).await.unwrap();
    assert_eq!(candles.len(), 3);
}

#[tokio::test]
async fn reserved_symbols_force_failures() {
    let src = MockSource::named("mock-b");
    let err = src.fetch(&req("BLOCKED")).await.unwrap_err();
    assert!(matches!(err, SpreadError::RegionBlocked { status: 451, .. }));
    let err = src.fetch(&req("FAIL")).await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(err.connector(), Some("mock-b"));
    let err = src.fetch(&req("MALFORMED")).await.unwrap_err();
    assert!(matches!(err, SpreadError::MalformedResponse { .. }));
}

#[tokio::test]
async fn sequences_are_consumed_before_the_standing_rule() {
    let (src, ctl) = DynamicMockSource::new_with_controller("dyn");
    let one = vec![Candle::new(req("x").start, Some(Decimal::ONE))];
    ctl.push_sequence(
        "BTCUSDT",
        vec![
            MockBehavior::Fail(SpreadError::unavailable("dyn", "502")),
            MockBehavior::Return(one.clone()),
        ],
    )
    .await;

    assert!(src.fetch(&req("BTCUSDT")).await.is_err());
    assert_eq!(src.fetch(&req("BTCUSDT")).await.unwrap(), one);
    // Drained: the last queued behavior keeps applying.
    assert_eq!(src.fetch(&req("BTCUSDT")).await.unwrap(), one);
    assert_eq!(ctl.calls().await, 3);

    let err = src.fetch(&req("OTHER")).await.unwrap_err();
    assert!(matches!(err, SpreadError::Rejected { status: 404, .. }));

    ctl.clear_all_behaviors().await;
    assert_eq!(ctl.calls().await, 0);
}

#[tokio::test]
async fn requests_are_logged_verbatim() {
    let (src, ctl) = DynamicMockSource::new_with_controller("dyn");
    ctl.set_behavior("BTCUSDT", MockBehavior::Return(Vec::new())).await;
    let _ = src.fetch(&req("BTCUSDT")).await;
    assert_eq!(ctl.requests().await, vec![req("BTCUSDT")]);
}
