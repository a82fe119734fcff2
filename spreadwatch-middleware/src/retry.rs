use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use spreadwatch_core::{Candle, CandleRequest, CandleSource, Middleware, SpreadError};
use spreadwatch_types::RetryConfig;

/// Decides whether a failed attempt is worth repeating.
pub type RetryPredicate = Arc<dyn Fn(&SpreadError) -> bool + Send + Sync>;

fn default_predicate() -> RetryPredicate {
    Arc::new(SpreadError::is_retryable)
}

fn with_jitter(delay: Duration, jitter_percent: u8) -> Duration {
    if jitter_percent == 0 || delay.is_zero() {
        return delay;
    }
    let base_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
    let range = std::cmp::max(1, base_ms.saturating_mul(u64::from(jitter_percent)) / 100);
    let mut rng = rand::rng();
    delay.saturating_add(Duration::from_millis(rng.random_range(0..range)))
}

/// Source wrapper that retries transient failures with linear backoff.
pub struct RetryingSource {
    inner: Arc<dyn CandleSource>,
    cfg: RetryConfig,
    should_retry: RetryPredicate,
}

impl RetryingSource {
    /// Wrap `inner` using the default retry predicate.
    pub fn new(inner: Arc<dyn CandleSource>, cfg: RetryConfig) -> Self {
        Self::with_predicate(inner, cfg, default_predicate())
    }

    /// Wrap `inner` with a custom retry predicate.
    pub fn with_predicate(
        inner: Arc<dyn CandleSource>,
        cfg: RetryConfig,
        should_retry: RetryPredicate,
    ) -> Self {
        Self {
            inner,
            cfg,
            should_retry,
        }
    }

    fn exhausted(&self, attempts: u32, last: SpreadError) -> SpreadError {
        SpreadError::RetriesExhausted {
            connector: self.inner.name().to_string(),
            attempts,
            last: Box::new(last),
        }
    }
}

#[async_trait]
impl CandleSource for RetryingSource {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn vendor(&self) -> &'static str {
        self.inner.vendor()
    }

    async fn fetch(&self, req: &CandleRequest) -> Result<Vec<Candle>, SpreadError> {
        let max_attempts = self.cfg.max_attempts.max(1);
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let err = match self.inner.fetch(req).await {
                Ok(candles) => return Ok(candles),
                Err(e) => e,
            };
            if !(self.should_retry)(&err) {
                return Err(err);
            }
            if attempt >= max_attempts {
                return Err(self.exhausted(attempt, err));
            }
            let delay = with_jitter(self.cfg.delay_after(attempt), self.cfg.jitter_percent);
            #[cfg(feature = "tracing")]
            tracing::warn!(
                connector = self.inner.name(),
                symbol = %req.symbol,
                attempt,
                max_attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "fetch failed; retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

/// Middleware descriptor that wraps a source in a [`RetryingSource`].
pub struct RetryMiddleware {
    cfg: RetryConfig,
    should_retry: RetryPredicate,
}

impl RetryMiddleware {
    /// Descriptor using the default retry predicate.
    #[must_use]
    pub fn new(cfg: RetryConfig) -> Self {
        Self {
            cfg,
            should_retry: default_predicate(),
        }
    }

    /// Descriptor with a custom retry predicate.
    #[must_use]
    pub fn with_predicate(cfg: RetryConfig, should_retry: RetryPredicate) -> Self {
        Self { cfg, should_retry }
    }
}

impl Middleware for RetryMiddleware {
    fn apply(self: Box<Self>, inner: Arc<dyn CandleSource>) -> Arc<dyn CandleSource> {
        Arc::new(RetryingSource::with_predicate(
            inner,
            self.cfg,
            self.should_retry,
        ))
    }

    fn name(&self) -> &'static str {
        "RetryingSource"
    }

    fn config_json(&self) -> serde_json::Value {
        serde_json::json!({
            "max_attempts": self.cfg.max_attempts,
            "base_delay_ms": u64::try_from(self.cfg.base_delay.as_millis()).unwrap_or(u64::MAX),
            "jitter_percent": self.cfg.jitter_percent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_jitter_keeps_delay() {
        let d = Duration::from_millis(1500);
        assert_eq!(with_jitter(d, 0), d);
        assert_eq!(with_jitter(Duration::ZERO, 50), Duration::ZERO);
    }

    #[test]
    fn jitter_stays_within_percent() {
        let d = Duration::from_millis(1000);
        for _ in 0..200 {
            let j = with_jitter(d, 20);
            assert!(j >= d);
            assert!(j < d + Duration::from_millis(200));
        }
    }
}
