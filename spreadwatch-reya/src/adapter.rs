use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use spreadwatch_core::SpreadError;
use spreadwatch_core::http;
use url::Url;

use crate::NAME;

/// Parameters of one candle history request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Market symbol, e.g. `BTCRUSDPERP`; becomes a path segment.
    pub symbol: String,
    /// Candle resolution, e.g. `1m`; becomes a path segment.
    pub resolution: String,
    /// `startTime` in epoch milliseconds.
    pub start_ms: i64,
    /// `endTime` in epoch milliseconds.
    pub end_ms: i64,
    /// Maximum candles to return.
    pub limit: usize,
}

/// Candle history transport (so we can inject fakes in tests).
#[async_trait]
pub trait ReyaCandles: Send + Sync {
    /// Fetch the raw JSON payload of `GET /v2/candleHistory/{symbol}/{resolution}`.
    async fn candle_history(&self, query: &HistoryQuery) -> Result<Value, SpreadError>;
}

/// Production adapter over a `reqwest::Client`.
#[derive(Clone)]
pub struct RealAdapter {
    http: reqwest::Client,
    base_url: Url,
}

impl RealAdapter {
    /// Build a client with the given per-request timeout.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the HTTP client cannot be built or `base_url` cannot
    /// carry path segments.
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, SpreadError> {
        Self::with_client(http::client(NAME, timeout)?, base_url)
    }

    /// Wrap an existing client.
    ///
    /// # Errors
    /// Returns `InvalidArg` if `base_url` cannot carry path segments.
    pub fn with_client(http: reqwest::Client, base_url: &Url) -> Result<Self, SpreadError> {
        if base_url.cannot_be_a_base() {
            return Err(SpreadError::InvalidArg(format!(
                "{NAME} base URL cannot carry a path: {base_url}"
            )));
        }
        Ok(Self {
            http,
            base_url: base_url.clone(),
        })
    }

    /// Endpoint for a symbol and resolution, each escaped as one path segment.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the base URL cannot carry path segments.
    pub fn endpoint(&self, symbol: &str, resolution: &str) -> Result<Url, SpreadError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                SpreadError::InvalidArg(format!("{NAME} base URL cannot carry a path"))
            })?
            .pop_if_empty()
            .extend(["v2", "candleHistory", symbol, resolution]);
        Ok(url)
    }
}

#[async_trait]
impl ReyaCandles for RealAdapter {
    async fn candle_history(&self, query: &HistoryQuery) -> Result<Value, SpreadError> {
        let url = self.endpoint(&query.symbol, &query.resolution)?;
        let request = self.http.get(url).query(&[
            ("startTime", query.start_ms.to_string()),
            ("endTime", query.end_ms.to_string()),
            ("limit", query.limit.to_string()),
        ]);
        http::get_json(NAME, request).await
    }
}

impl dyn ReyaCandles {
    /// Build a `ReyaCandles` from a closure.
    pub fn from_fn<F>(f: F) -> Arc<dyn ReyaCandles>
    where
        F: Send + Sync + 'static + Fn(HistoryQuery) -> Result<Value, SpreadError>,
    {
        struct FnCandles<F>(F);
        #[async_trait]
        impl<F> ReyaCandles for FnCandles<F>
        where
            F: Send + Sync + 'static + Fn(HistoryQuery) -> Result<Value, SpreadError>,
        {
            async fn candle_history(&self, query: &HistoryQuery) -> Result<Value, SpreadError> {
                (self.0)(query.clone())
            }
        }
        Arc::new(FnCandles(f))
    }
}
