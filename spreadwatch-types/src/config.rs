//! Configuration types shared by the orchestrator, connectors, and middleware.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::SpreadError;

/// File stem used for the persisted CSV and JSON datasets.
pub const DEFAULT_OUTPUT_STEM: &str = "btc_reya_vs_binance_1m";

/// Retry policy applied around every source fetch.
///
/// The delay before attempt `k + 1` is `base_delay * k`, optionally widened by
/// `jitter_percent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one (>= 1).
    pub max_attempts: u32,
    /// Base delay multiplied by the attempt number.
    pub base_delay: Duration,
    /// Random jitter percentage [0, 100] added to each delay.
    pub jitter_percent: u8,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1500),
            jitter_percent: 0,
        }
    }
}

impl RetryConfig {
    /// Delay to wait after the failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

/// Endpoint and instrument for one market-data provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the provider's REST API.
    pub base_url: Url,
    /// Provider-native symbol, e.g. `BTCUSDT`.
    pub symbol: String,
}

/// Where and under which name the dataset is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory, created on demand.
    pub dir: PathBuf,
    /// File stem shared by the `.csv` and `.json` outputs.
    pub stem: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            stem: DEFAULT_OUTPUT_STEM.to_string(),
        }
    }
}

impl OutputConfig {
    /// Path of the tabular output.
    #[must_use]
    pub fn csv_path(&self) -> PathBuf {
        self.dir.join(format!("{}.csv", self.stem))
    }

    /// Path of the structured output.
    #[must_use]
    pub fn json_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.stem))
    }
}

/// Global configuration for one spreadwatch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadConfig {
    /// Source A: mark-price klines provider.
    pub source_a: ProviderConfig,
    /// Source B: candle history provider.
    pub source_b: ProviderConfig,
    /// Candle resolution requested from both providers.
    pub resolution: String,
    /// Number of minute rows retained in the rolling window.
    pub rows: usize,
    /// Output location.
    pub output: OutputConfig,
    /// Timeout for an individual provider request.
    pub request_timeout: Duration,
    /// Retry policy applied to each source.
    pub retry: RetryConfig,
}

impl Default for SpreadConfig {
    fn default() -> Self {
        Self {
            source_a: ProviderConfig {
                base_url: default_url("https://fapi.binance.com"),
                symbol: "BTCUSDT".to_string(),
            },
            source_b: ProviderConfig {
                base_url: default_url("https://api.reya.xyz"),
                symbol: "BTCRUSDPERP".to_string(),
            },
            resolution: "1m".to_string(),
            rows: 1440,
            output: OutputConfig::default(),
            request_timeout: Duration::from_secs(20),
            retry: RetryConfig::default(),
        }
    }
}

#[allow(clippy::expect_used)]
fn default_url(s: &str) -> Url {
    Url::parse(s).expect("static default URL parses")
}

impl SpreadConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    /// Returns `SpreadError::InvalidArg` when a variable is present but invalid.
    pub fn from_env() -> Result<Self, SpreadError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Unset and empty values fall back to defaults.
    ///
    /// # Errors
    /// Returns `SpreadError::InvalidArg` when a value is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SpreadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut cfg = Self::default();

        if let Some(v) = get("BINANCE_SYMBOL") {
            cfg.source_a.symbol = v.trim().to_string();
        }
        if let Some(v) = get("REYA_SYMBOL") {
            cfg.source_b.symbol = v.trim().to_string();
        }
        if let Some(v) = get("BINANCE_BASE_URL") {
            cfg.source_a.base_url = parse_url("BINANCE_BASE_URL", &v)?;
        }
        if let Some(v) = get("REYA_BASE_URL") {
            cfg.source_b.base_url = parse_url("REYA_BASE_URL", &v)?;
        }
        if let Some(v) = get("RESOLUTION") {
            cfg.resolution = v.trim().to_string();
        }
        if let Some(v) = get("ROWS") {
            cfg.rows = parse_num("ROWS", &v)?;
        }
        if let Some(v) = get("OUT_DIR") {
            cfg.output.dir = PathBuf::from(v);
        }
        if let Some(v) = get("OUTPUT_STEM") {
            cfg.output.stem = v.trim().to_string();
        }
        if let Some(v) = get("REQUEST_TIMEOUT_SECONDS") {
            cfg.request_timeout = Duration::from_secs(parse_num("REQUEST_TIMEOUT_SECONDS", &v)?);
        }
        if let Some(v) = get("MAX_RETRIES") {
            cfg.retry.max_attempts = parse_num("MAX_RETRIES", &v)?;
        }
        if let Some(v) = get("BACKOFF_SECONDS") {
            let secs: f64 = parse_num("BACKOFF_SECONDS", &v)?;
            cfg.retry.base_delay = Duration::try_from_secs_f64(secs).map_err(|_| {
                SpreadError::InvalidArg(format!("BACKOFF_SECONDS must be >= 0, got {v}"))
            })?;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Check cross-field invariants.
    ///
    /// # Errors
    /// Returns `SpreadError::InvalidArg` describing the first violated constraint.
    pub fn validate(&self) -> Result<(), SpreadError> {
        if self.rows == 0 {
            return Err(SpreadError::InvalidArg("ROWS must be positive".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(SpreadError::InvalidArg("MAX_RETRIES must be at least 1".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(SpreadError::InvalidArg(
                "REQUEST_TIMEOUT_SECONDS must be positive".into(),
            ));
        }
        if self.retry.jitter_percent > 100 {
            return Err(SpreadError::InvalidArg(
                "jitter_percent must be within [0, 100]".into(),
            ));
        }
        if self.output.stem.is_empty() {
            return Err(SpreadError::InvalidArg("OUTPUT_STEM must not be empty".into()));
        }
        if self.source_a.symbol.is_empty() || self.source_b.symbol.is_empty() {
            return Err(SpreadError::InvalidArg("provider symbols must not be empty".into()));
        }
        Ok(())
    }
}

fn parse_url(key: &str, raw: &str) -> Result<Url, SpreadError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| SpreadError::InvalidArg(format!("{key} is not a valid URL ({e}): {raw}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(SpreadError::InvalidArg(format!(
            "{key} must use http or https: {raw}"
        )));
    }
    Ok(url)
}

fn parse_num<T>(key: &str, raw: &str) -> Result<T, SpreadError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| SpreadError::InvalidArg(format!("{key}={raw}: {e}")))
}
