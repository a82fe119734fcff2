use std::sync::Arc;
use std::time::Duration;

use spreadwatch_core::{CandleSource, RetryConfig, SpreadError};
use spreadwatch_middleware::SourceBuilder;
use url::Url;

use crate::ReyaConnector;

/// Builder type alias specialized for Reya sources.
pub type ReyaSourceBuilder = SourceBuilder;

impl ReyaConnector {
    /// Returns an unconfigured builder around a production connector.
    ///
    /// # Errors
    /// Fails when the HTTP client cannot be built for `base_url`.
    pub fn builder(base_url: &Url, timeout: Duration) -> Result<ReyaSourceBuilder, SpreadError> {
        let raw: Arc<dyn CandleSource> = Arc::new(Self::new(base_url, timeout)?);
        Ok(SourceBuilder::new(raw))
    }

    /// Returns a builder with the default retry policy already layered on.
    ///
    /// # Errors
    /// Fails when the HTTP client cannot be built for `base_url`.
    pub fn with_default_retry(
        base_url: &Url,
        timeout: Duration,
    ) -> Result<ReyaSourceBuilder, SpreadError> {
        Ok(Self::builder(base_url, timeout)?.with_retry(&RetryConfig::default()))
    }
}
