use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use spreadwatch_core::SpreadError;
use spreadwatch_core::http;
use url::Url;

use crate::NAME;

/// Query parameters of one mark-price kline request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KlineQuery {
    /// Futures symbol, e.g. `BTCUSDT`.
    pub symbol: String,
    /// Kline interval, e.g. `1m`.
    pub interval: String,
    /// `startTime` in epoch milliseconds.
    pub start_ms: i64,
    /// `endTime` in epoch milliseconds.
    pub end_ms: i64,
    /// Maximum klines to return.
    pub limit: usize,
}

/// Mark-price kline transport (so we can inject fakes in tests).
#[async_trait]
pub trait BinanceKlines: Send + Sync {
    /// Fetch the raw JSON payload of `GET /fapi/v1/markPriceKlines`.
    async fn mark_price_klines(&self, query: &KlineQuery) -> Result<Value, SpreadError>;
}

/// Production adapter over a `reqwest::Client`.
#[derive(Clone)]
pub struct RealAdapter {
    http: reqwest::Client,
    endpoint: Url,
}

impl RealAdapter {
    /// Build a client with the given per-request timeout.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the HTTP client cannot be built or the endpoint URL
    /// cannot be derived from `base_url`.
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, SpreadError> {
        Self::with_client(http::client(NAME, timeout)?, base_url)
    }

    /// Wrap an existing client.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the endpoint URL cannot be derived from `base_url`.
    pub fn with_client(http: reqwest::Client, base_url: &Url) -> Result<Self, SpreadError> {
        let raw = format!(
            "{}/fapi/v1/markPriceKlines",
            base_url.as_str().trim_end_matches('/')
        );
        let endpoint = Url::parse(&raw)
            .map_err(|e| SpreadError::InvalidArg(format!("{NAME} endpoint {raw}: {e}")))?;
        Ok(Self { http, endpoint })
    }

    /// Fully qualified endpoint the adapter calls.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl BinanceKlines for RealAdapter {
    async fn mark_price_klines(&self, query: &KlineQuery) -> Result<Value, SpreadError> {
        let request = self.http.get(self.endpoint.clone()).query(&[
            ("symbol", query.symbol.clone()),
            ("interval", query.interval.clone()),
            ("limit", query.limit.to_string()),
            ("startTime", query.start_ms.to_string()),
            ("endTime", query.end_ms.to_string()),
        ]);
        http::get_json(NAME, request).await
    }
}

/* -------- Test-only lightweight adapter constructor ------- */

impl dyn BinanceKlines {
    /// Build a `BinanceKlines` from a closure.
    pub fn from_fn<F>(f: F) -> Arc<dyn BinanceKlines>
    where
        F: Send + Sync + 'static + Fn(KlineQuery) -> Result<Value, SpreadError>,
    {
        struct FnKlines<F>(F);
        #[async_trait]
        impl<F> BinanceKlines for FnKlines<F>
        where
            F: Send + Sync + 'static + Fn(KlineQuery) -> Result<Value, SpreadError>,
        {
            async fn mark_price_klines(&self, query: &KlineQuery) -> Result<Value, SpreadError> {
                (self.0)(query.clone())
            }
        }
        Arc::new(FnKlines(f))
    }
}
