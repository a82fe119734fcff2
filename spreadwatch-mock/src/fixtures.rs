use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use spreadwatch_core::{Candle, floor_to_minute};

/// Base close in cents for well-known symbols; anything else starts at 100.00.
fn base_cents(symbol: &str) -> i64 {
    match symbol {
        "BTCUSDT" => 6_000_000,
        "BTCRUSDPERP" => 6_003_000,
        "ETHUSDT" => 300_000,
        _ => 10_000,
    }
}

/// Deterministic one-minute candles covering `[start, end]`, oldest first, at most `limit`.
///
/// The close oscillates in a small saw pattern so neighbouring minutes differ.
pub fn minute_candles(
    symbol: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    limit: usize,
) -> Vec<Candle> {
    let base = base_cents(symbol);
    let mut out = Vec::new();
    let mut ts = floor_to_minute(start);
    if ts < start {
        ts += Duration::minutes(1);
    }
    while ts <= end && out.len() < limit {
        let wiggle = (ts.timestamp() / 60).rem_euclid(7) * 5;
        out.push(Candle::new(ts, Some(Decimal::new(base + wiggle, 2))));
        ts += Duration::minutes(1);
    }
    out
}
