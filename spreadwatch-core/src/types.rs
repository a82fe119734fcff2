//! Domain records plus re-exports of the shared `spreadwatch-types` crate.
// Consolidated re-exports so downstream crates can depend on `spreadwatch-core` only

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use rust_decimal::Decimal;
pub use spreadwatch_types::{
    ConnectorKey, DEFAULT_OUTPUT_STEM, OutputConfig, ProviderConfig, RetryConfig, RunReport,
    SourceReport, SpreadConfig, SpreadError,
};

/// Close price per minute for one source. `None` records a candle whose close was null.
pub type MinuteSeries = BTreeMap<DateTime<Utc>, Option<Decimal>>;

/// A provider candle reduced to what the comparison needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    /// Open time as reported by the provider (not yet truncated).
    pub ts: DateTime<Utc>,
    /// Close price; absent when the provider reported null.
    pub close: Option<Decimal>,
}

impl Candle {
    /// Convenience constructor.
    #[must_use]
    pub const fn new(ts: DateTime<Utc>, close: Option<Decimal>) -> Self {
        Self { ts, close }
    }
}

/// Parameters of a single candle fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandleRequest {
    /// Provider-native symbol.
    pub symbol: String,
    /// Provider-native resolution, e.g. `1m`.
    pub resolution: String,
    /// Inclusive range start.
    pub start: DateTime<Utc>,
    /// Inclusive range end.
    pub end: DateTime<Utc>,
    /// Requested maximum number of candles; connectors clamp to provider limits.
    pub limit: usize,
}

/// One minute of the comparison dataset.
///
/// Serialized field names match the persisted column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRow {
    /// Minute the row describes; the dataset key.
    #[serde(rename = "ts_utc", with = "ts_format")]
    pub minute: DateTime<Utc>,
    /// Source A close.
    #[serde(default, with = "json_number")]
    pub source_a_close: Option<Decimal>,
    /// Source B close.
    #[serde(default, with = "json_number")]
    pub source_b_close: Option<Decimal>,
    /// `source_b_close - source_a_close`.
    #[serde(rename = "abs_diff", default, with = "json_number")]
    pub absolute_diff: Option<Decimal>,
    /// `absolute_diff / source_a_close * 100`.
    #[serde(rename = "diff_pct", default, with = "json_number")]
    pub percent_diff: Option<Decimal>,
    /// Instant of the run that last wrote this row.
    #[serde(rename = "updated_at_utc", with = "ts_format")]
    pub last_updated: DateTime<Utc>,
}

/// Optional decimals as plain JSON numbers.
///
/// The number is produced by parsing the decimal's text into the nearest `f64`, and
/// read back through the shortest text of that `f64`. Values of up to
/// [`SIGNIFICANT_DIGITS`](crate::SIGNIFICANT_DIGITS) significant digits therefore
/// load exactly as they were saved.
pub mod json_number {
    use rust_decimal::Decimal;
    use serde::{Deserializer, Serializer};

    /// Serde serializer.
    ///
    /// # Errors
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(value: &Option<Decimal>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => {
                let text = d.normalize().to_string();
                let n: f64 = text.parse().map_err(serde::ser::Error::custom)?;
                s.serialize_f64(n)
            }
            None => s.serialize_none(),
        }
    }

    /// Serde deserializer accepting numbers, numeric strings, and `null`.
    ///
    /// # Errors
    /// Fails on values that are not numeric.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Decimal>, D::Error> {
        rust_decimal::serde::float_option::deserialize(d)
    }
}

/// `YYYY-MM-DD HH:MM:SSZ` timestamps as used by the persisted files.
pub mod ts_format {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// strftime pattern of persisted timestamps.
    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%SZ";

    /// Render a timestamp in the persisted format.
    #[must_use]
    pub fn format(ts: &DateTime<Utc>) -> String {
        ts.format(FORMAT).to_string()
    }

    /// Parse a timestamp in the persisted format.
    ///
    /// # Errors
    /// Returns the chrono parse error when `s` does not match [`FORMAT`].
    pub fn parse(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        NaiveDateTime::parse_from_str(s, FORMAT).map(|n| n.and_utc())
    }

    /// Serde serializer.
    ///
    /// # Errors
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format(ts))
    }

    /// Serde deserializer.
    ///
    /// # Errors
    /// Fails when the string does not match [`FORMAT`].
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }
}
