//! Builder for composing candle sources with middleware layers.
//!
//! Layers form an onion around the raw source. The `layers` vector stores
//! middleware outermost-first (last added = outermost) and `build()` applies them in
//! reverse, so `layers[0]` ends up wrapping everything else:
//!
//! ```text
//! builder.with_retry(..).layer(custom)
//!
//! Storage: [Custom, Retry]
//! Result:  Custom(Retry(Raw))
//! ```

use std::sync::Arc;

use spreadwatch_core::{CandleSource, Middleware};
use spreadwatch_types::RetryConfig;

use crate::retry::{RetryMiddleware, RetryPredicate};

const RETRY: &str = "RetryingSource";

/// Generic middleware builder for composing a source with layered wrappers.
pub struct SourceBuilder {
    raw: Arc<dyn CandleSource>,
    /// Middleware layers in outermost-first order.
    layers: Vec<Box<dyn Middleware>>,
}

impl SourceBuilder {
    /// Create a new builder from a raw, unwrapped source.
    #[must_use]
    pub fn new(raw: Arc<dyn CandleSource>) -> Self {
        Self {
            raw,
            layers: Vec::new(),
        }
    }

    fn existing_retry_config(&self) -> Option<RetryConfig> {
        self.layers.iter().find(|l| l.name() == RETRY).map(|l| {
            let cfg = l.config_json();
            let defaults = RetryConfig::default();
            RetryConfig {
                max_attempts: cfg
                    .get("max_attempts")
                    .and_then(serde_json::Value::as_u64)
                    .and_then(|v| u32::try_from(v).ok())
                    .unwrap_or(defaults.max_attempts),
                base_delay: cfg
                    .get("base_delay_ms")
                    .and_then(serde_json::Value::as_u64)
                    .map_or(defaults.base_delay, std::time::Duration::from_millis),
                jitter_percent: cfg
                    .get("jitter_percent")
                    .and_then(serde_json::Value::as_u64)
                    .and_then(|v| u8::try_from(v).ok())
                    .unwrap_or(defaults.jitter_percent),
            }
        })
    }

    /// Add or replace the retry layer, as the outermost layer.
    #[must_use]
    pub fn with_retry(mut self, cfg: &RetryConfig) -> Self {
        self.layers.retain(|m| m.name() != RETRY);
        self.layers.insert(0, Box::new(RetryMiddleware::new(*cfg)));
        self
    }

    /// Add or replace the retry layer with a custom retryability predicate.
    #[must_use]
    pub fn with_retry_predicate(mut self, cfg: &RetryConfig, should_retry: RetryPredicate) -> Self {
        self.layers.retain(|m| m.name() != RETRY);
        self.layers
            .insert(0, Box::new(RetryMiddleware::with_predicate(*cfg, should_retry)));
        self
    }

    /// Shortcut: set total attempts only (preserves an existing delay/jitter).
    #[must_use]
    pub fn max_attempts(self, attempts: u32) -> Self {
        let mut cfg = self.existing_retry_config().unwrap_or_default();
        cfg.max_attempts = attempts;
        self.with_retry(&cfg)
    }

    /// Remove the retry layer if present.
    #[must_use]
    pub fn without_retry(mut self) -> Self {
        self.layers.retain(|m| m.name() != RETRY);
        self
    }

    /// Add an arbitrary middleware layer at the outermost position.
    #[must_use]
    pub fn layer(mut self, layer: Box<dyn Middleware>) -> Self {
        self.layers.insert(0, layer);
        self
    }

    /// Names of the configured layers, outermost first.
    #[must_use]
    pub fn layer_names(&self) -> Vec<&'static str> {
        self.layers.iter().map(|l| l.name()).collect()
    }

    /// Build the wrapped source, applying layers innermost first.
    #[must_use]
    pub fn build(self) -> Arc<dyn CandleSource> {
        let mut acc: Arc<dyn CandleSource> = Arc::clone(&self.raw);
        for m in self.layers.into_iter().rev() {
            acc = m.apply(acc);
        }
        acc
    }
}
