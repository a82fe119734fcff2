use async_trait::async_trait;

use crate::types::{Candle, CandleRequest};
use spreadwatch_types::{ConnectorKey, SpreadError};

/// A market-data provider able to return one-minute candles for a time range.
///
/// Implementations perform exactly one logical request per call and never retry;
/// retries are layered on through [`Middleware`](crate::Middleware).
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Stable connector name used in logs, reports, and error attribution.
    fn name(&self) -> &'static str;

    /// Human-readable vendor name.
    fn vendor(&self) -> &'static str;

    /// Typed key derived from [`name`](Self::name).
    fn key(&self) -> ConnectorKey {
        ConnectorKey::new(self.name())
    }

    /// Fetch candles for `req`.
    ///
    /// Candles are returned with their raw open time; minute truncation happens in
    /// [`align_to_minutes`](crate::align_to_minutes).
    ///
    /// # Errors
    /// Returns a source-side `SpreadError` (unavailable, timeout, region blocked,
    /// rejected, or malformed response).
    async fn fetch(&self, req: &CandleRequest) -> Result<Vec<Candle>, SpreadError>;
}
