//! Middleware trait for wrapping `CandleSource` implementations.

use std::sync::Arc;

use crate::connector::CandleSource;

/// Trait implemented by connector middleware layers.
///
/// A middleware consumes an inner `CandleSource` and returns a wrapped source that
/// augments its behavior (e.g., retries).
pub trait Middleware: Send + Sync {
    /// Apply this middleware to wrap an inner source and return the wrapped source.
    fn apply(self: Box<Self>, inner: Arc<dyn CandleSource>) -> Arc<dyn CandleSource>;

    /// Human-readable middleware name for introspection/logging.
    fn name(&self) -> &'static str;

    /// Opaque configuration snapshot for serialization/inspection.
    fn config_json(&self) -> serde_json::Value;
}
