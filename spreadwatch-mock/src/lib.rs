//! spreadwatch-mock
//!
//! Deterministic candle sources for tests and local runs.
use async_trait::async_trait;
use spreadwatch_core::{Candle, CandleRequest, CandleSource, SpreadError};

mod dynamic;
mod fixtures;

pub use dynamic::{DynamicMockController, DynamicMockSource, MockBehavior};
pub use fixtures::minute_candles;

/// Mock source serving deterministic fixture candles for any range.
pub struct MockSource {
    name: &'static str,
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSource {
    /// Mock named `spreadwatch-mock`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            name: "spreadwatch-mock",
        }
    }

    /// Same fixtures under a different connector name, for two-source setups.
    #[must_use]
    pub const fn named(name: &'static str) -> Self {
        Self { name }
    }

    fn maybe_fail(&self, symbol: &str) -> Result<(), SpreadError> {
        match symbol {
            "FAIL" => Err(SpreadError::unavailable(self.name, "forced failure")),
            "BLOCKED" => Err(SpreadError::from_status(self.name, 451, "")),
            "TIMEOUT" => Err(SpreadError::provider_timeout(self.name)),
            "MALFORMED" => Err(SpreadError::malformed(
                self.name,
                "candle array",
                "forced malformed payload",
            )),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl CandleSource for MockSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn vendor(&self) -> &'static str {
        "Mock"
    }

    async fn fetch(&self, req: &CandleRequest) -> Result<Vec<Candle>, SpreadError> {
        self.maybe_fail(&req.symbol)?;
        Ok(fixtures::minute_candles(
            &req.symbol,
            req.start,
            req.end,
            req.limit,
        ))
    }
}
