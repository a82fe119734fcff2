//! spreadwatch-reya
//!
//! `CandleSource` for the Reya candle history endpoint. The payload reader accepts
//! the several shapes the endpoint has served over time.
#![warn(missing_docs)]

/// Transport abstraction and the production adapter backed by `reqwest`.
pub mod adapter;
mod builder;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use spreadwatch_core::payload::{close_from_json, describe, timestamp_from_json};
use spreadwatch_core::{Candle, CandleRequest, CandleSource, ConnectorKey, Decimal, SpreadError};
use url::Url;

use adapter::{HistoryQuery, RealAdapter, ReyaCandles};
pub use builder::ReyaSourceBuilder;

/// Connector name used in errors and logs.
pub const NAME: &str = "spreadwatch-reya";

/// Smallest `limit` sent to the endpoint.
pub const MIN_LIMIT: usize = 1500;

const CONTAINER_KEYS: [&str; 4] = ["candles", "data", "result", "items"];
const TIMESTAMP_KEYS: [&str; 5] = ["timestamp", "time", "t", "openTime", "open_time"];
const CLOSE_KEYS: [&str; 4] = ["close", "c", "closePrice", "close_price"];

// Epoch values below this are seconds.
fn seconds_below() -> Decimal {
    Decimal::from(1_000_000_000_000_i64)
}

/// Public connector type. Production users construct it with [`ReyaConnector::new`].
pub struct ReyaConnector {
    candles: Arc<dyn ReyaCandles>,
}

impl ReyaConnector {
    /// Static connector key.
    pub const KEY: ConnectorKey = ConnectorKey::new(NAME);

    /// Connector talking to `base_url` with a per-request `timeout`.
    ///
    /// # Errors
    /// Fails when the HTTP client cannot be built for `base_url`.
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, SpreadError> {
        Ok(Self::with_adapter(Arc::new(RealAdapter::new(
            base_url, timeout,
        )?)))
    }

    /// Connector over an arbitrary transport.
    #[must_use]
    pub fn with_adapter(candles: Arc<dyn ReyaCandles>) -> Self {
        Self { candles }
    }

    /// Translate a generic request into endpoint parameters.
    #[must_use]
    pub fn query_for(req: &CandleRequest) -> HistoryQuery {
        HistoryQuery {
            symbol: req.symbol.clone(),
            resolution: req.resolution.clone(),
            start_ms: req.start.timestamp_millis(),
            end_ms: req.end.timestamp_millis(),
            limit: req.limit.max(MIN_LIMIT),
        }
    }
}

fn candle_list(payload: &Value) -> Option<&Vec<Value>> {
    match payload {
        Value::Array(items) => Some(items),
        Value::Object(map) => CONTAINER_KEYS
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_array)),
        _ => None,
    }
}

fn first_present<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| map.get(*k))
}

fn read_timestamp(i: usize, raw: &Value) -> Result<Option<DateTime<Utc>>, SpreadError> {
    if raw.is_null() {
        return Ok(None);
    }
    timestamp_from_json(raw, Some(seconds_below()))
        .map(Some)
        .ok_or_else(|| {
            SpreadError::malformed(NAME, format!("candle {i} epoch timestamp"), describe(raw))
        })
}

fn read_close(i: usize, raw: Option<&Value>) -> Result<Option<Decimal>, SpreadError> {
    raw.map_or(Ok(None), |v| {
        close_from_json(v)
            .map_err(|received| SpreadError::malformed(NAME, format!("candle {i} close price"), received))
    })
}

/// Parse one candle; `Ok(None)` when the entry carries no usable timestamp.
fn parse_candle(i: usize, item: &Value) -> Result<Option<Candle>, SpreadError> {
    let (ts_raw, close_raw) = match item {
        Value::Array(fields) if fields.len() >= 5 => (Some(&fields[0]), Some(&fields[4])),
        Value::Object(map) => (
            first_present(map, &TIMESTAMP_KEYS),
            first_present(map, &CLOSE_KEYS),
        ),
        _ => return Ok(None),
    };
    let Some(ts) = ts_raw.map(|raw| read_timestamp(i, raw)).transpose()?.flatten() else {
        return Ok(None);
    };
    Ok(Some(Candle::new(ts, read_close(i, close_raw)?)))
}

/// Parse a candle history payload.
///
/// # Errors
/// Returns `MalformedResponse` when no candle list can be located, when a present
/// timestamp or close is not numeric, or when no usable candle remains.
pub fn parse_candles(payload: &Value) -> Result<Vec<Candle>, SpreadError> {
    let items = candle_list(payload).ok_or_else(|| {
        SpreadError::malformed(
            NAME,
            "array of candles, or object with a candles/data/result/items array",
            describe(payload),
        )
    })?;
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        if let Some(c) = parse_candle(i, item)? {
            out.push(c);
        }
    }
    if out.is_empty() {
        return Err(SpreadError::malformed(
            NAME,
            "at least one candle",
            describe(payload),
        ));
    }
    Ok(out)
}

#[async_trait]
impl CandleSource for ReyaConnector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn vendor(&self) -> &'static str {
        "Reya"
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "spreadwatch_reya::fetch",
            skip(self, req),
            fields(symbol = %req.symbol, resolution = %req.resolution),
        )
    )]
    async fn fetch(&self, req: &CandleRequest) -> Result<Vec<Candle>, SpreadError> {
        let query = Self::query_for(req);
        let payload = self.candles.candle_history(&query).await?;
        let candles = parse_candles(&payload)?;
        #[cfg(feature = "tracing")]
        tracing::debug!(count = candles.len(), "parsed candle history");
        Ok(candles)
    }
}
