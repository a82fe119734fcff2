//! spreadwatch-binance
//!
//! `CandleSource` for Binance USD-M futures mark-price klines.
#![warn(missing_docs)]

/// Transport abstraction and the production adapter backed by `reqwest`.
pub mod adapter;
mod builder;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use spreadwatch_core::payload::{close_from_json, describe, timestamp_from_json};
use spreadwatch_core::{Candle, CandleRequest, CandleSource, ConnectorKey, SpreadError};
use url::Url;

use adapter::{BinanceKlines, KlineQuery, RealAdapter};
pub use builder::BinanceSourceBuilder;

/// Connector name used in errors and logs.
pub const NAME: &str = "spreadwatch-binance";

/// Largest `limit` the mark-price kline endpoint accepts.
pub const MAX_LIMIT: usize = 1500;

/// Public connector type. Production users construct it with [`BinanceConnector::new`].
pub struct BinanceConnector {
    klines: Arc<dyn BinanceKlines>,
}

impl BinanceConnector {
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
    pub fn with_adapter(klines: Arc<dyn BinanceKlines>) -> Self {
        Self { klines }
    }

    /// Translate a generic request into endpoint parameters.
    #[must_use]
    pub fn query_for(req: &CandleRequest) -> KlineQuery {
        KlineQuery {
            symbol: req.symbol.clone(),
            interval: req.resolution.clone(),
            start_ms: req.start.timestamp_millis(),
            end_ms: req.end.timestamp_millis(),
            limit: req.limit.clamp(1, MAX_LIMIT),
        }
    }
}

/// Parse a mark-price kline payload.
///
/// Any kline that is not an array of at least five fields, or whose open time or
/// close cannot be read, rejects the whole payload.
///
/// # Errors
/// Returns `MalformedResponse` describing the first offending element.
pub fn parse_klines(payload: &Value) -> Result<Vec<Candle>, SpreadError> {
    let rows = payload
        .as_array()
        .ok_or_else(|| SpreadError::malformed(NAME, "array of klines", describe(payload)))?;
    rows.iter()
        .enumerate()
        .map(|(i, k)| parse_kline(i, k))
        .collect()
}

fn parse_kline(i: usize, kline: &Value) -> Result<Candle, SpreadError> {
    let fields = kline
        .as_array()
        .filter(|f| f.len() >= 5)
        .ok_or_else(|| {
            SpreadError::malformed(
                NAME,
                format!("kline {i} as an array of at least 5 fields"),
                describe(kline),
            )
        })?;
    let ts = timestamp_from_json(&fields[0], None).ok_or_else(|| {
        SpreadError::malformed(NAME, format!("kline {i} open time in epoch ms"), describe(&fields[0]))
    })?;
    let close = close_from_json(&fields[4])
        .map_err(|received| SpreadError::malformed(NAME, format!("kline {i} close price"), received))?;
    Ok(Candle::new(ts, close))
}

#[async_trait]
impl CandleSource for BinanceConnector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn vendor(&self) -> &'static str {
        "Binance USD-M Futures"
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "spreadwatch_binance::fetch",
            skip(self, req),
            fields(symbol = %req.symbol, interval = %req.resolution, limit = req.limit),
        )
    )]
    async fn fetch(&self, req: &CandleRequest) -> Result<Vec<Candle>, SpreadError> {
        let query = Self::query_for(req);
        let payload = self.klines.mark_price_klines(&query).await?;
        let candles = parse_klines(&payload)?;
        #[cfg(feature = "tracing")]
        tracing::debug!(count = candles.len(), "parsed mark-price klines");
        Ok(candles)
    }
}
