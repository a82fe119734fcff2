use std::sync::Arc;

use chrono::{DateTime, Utc};
use spreadwatch_binance::BinanceConnector;
use spreadwatch_core::{
    Candle, CandleRequest, CandleSource, MinuteRange, MinuteSeries, OutputConfig, RunReport,
    SourceReport, SpreadConfig, SpreadError, align_to_minutes, merge_minutes, reconcile,
};
use spreadwatch_reya::ReyaConnector;

use crate::persist::{DatasetStore, FileStore};

/// Extra candles requested beyond the window so edge minutes are never cut short.
pub const LIMIT_HEADROOM: usize = 60;

struct SourceSlot {
    source: Arc<dyn CandleSource>,
    symbol: String,
}

/// Orchestrator for one comparison dataset: fetches both sources, merges them by
/// minute, and maintains the rolling window on disk.
pub struct Spreadwatch {
    source_a: SourceSlot,
    source_b: SourceSlot,
    resolution: String,
    rows: usize,
    store: Arc<dyn DatasetStore>,
}

/// Builder for constructing a [`Spreadwatch`].
pub struct SpreadwatchBuilder {
    source_a: Option<SourceSlot>,
    source_b: Option<SourceSlot>,
    resolution: String,
    rows: usize,
    store: Option<Arc<dyn DatasetStore>>,
}

impl Default for SpreadwatchBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SpreadwatchBuilder {
    /// Builder with `1m` resolution and a 1440-row window; sources and store unset.
    #[must_use]
    pub fn new() -> Self {
        let defaults = SpreadConfig::default();
        Self {
            source_a: None,
            source_b: None,
            resolution: defaults.resolution,
            rows: defaults.rows,
            store: None,
        }
    }

    /// Reference source; its close is the denominator of `diff_pct`.
    #[must_use]
    pub fn source_a(mut self, source: Arc<dyn CandleSource>, symbol: impl Into<String>) -> Self {
        self.source_a = Some(SourceSlot {
            source,
            symbol: symbol.into(),
        });
        self
    }

    /// Compared source.
    #[must_use]
    pub fn source_b(mut self, source: Arc<dyn CandleSource>, symbol: impl Into<String>) -> Self {
        self.source_b = Some(SourceSlot {
            source,
            symbol: symbol.into(),
        });
        self
    }

    /// Candle resolution requested from both sources.
    #[must_use]
    pub fn resolution(mut self, resolution: impl Into<String>) -> Self {
        self.resolution = resolution.into();
        self
    }

    /// Number of minute rows retained.
    #[must_use]
    pub const fn rows(mut self, rows: usize) -> Self {
        self.rows = rows;
        self
    }

    /// Persist through an arbitrary store.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn DatasetStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Persist as CSV + JSON files.
    #[must_use]
    pub fn output(self, output: OutputConfig) -> Self {
        self.store(Arc::new(FileStore::new(output)))
    }

    /// Build the orchestrator.
    ///
    /// # Errors
    /// Returns `InvalidArg` if a source or the store is missing, or `rows` is zero.
    pub fn build(self) -> Result<Spreadwatch, SpreadError> {
        let missing = |what: &str| SpreadError::InvalidArg(format!("{what} not configured"));
        if self.rows == 0 {
            return Err(SpreadError::InvalidArg("rows must be positive".into()));
        }
        Ok(Spreadwatch {
            source_a: self.source_a.ok_or_else(|| missing("source A"))?,
            source_b: self.source_b.ok_or_else(|| missing("source B"))?,
            resolution: self.resolution,
            rows: self.rows,
            store: self.store.ok_or_else(|| missing("dataset store"))?,
        })
    }
}

impl Spreadwatch {
    /// Start building a new `Spreadwatch` instance.
    #[must_use]
    pub fn builder() -> SpreadwatchBuilder {
        SpreadwatchBuilder::new()
    }

    /// Production wiring: Binance mark price as source A, Reya as source B, both
    /// wrapped in the configured retry policy, persisted under `cfg.output`.
    ///
    /// # Errors
    /// Returns `InvalidArg` for an invalid configuration or HTTP client setup failure.
    pub fn from_config(cfg: &SpreadConfig) -> Result<Self, SpreadError> {
        cfg.validate()?;
        let binance = BinanceConnector::builder(&cfg.source_a.base_url, cfg.request_timeout)?
            .with_retry(&cfg.retry)
            .build();
        let reya = ReyaConnector::builder(&cfg.source_b.base_url, cfg.request_timeout)?
            .with_retry(&cfg.retry)
            .build();
        Self::builder()
            .source_a(binance, cfg.source_a.symbol.clone())
            .source_b(reya, cfg.source_b.symbol.clone())
            .resolution(cfg.resolution.clone())
            .rows(cfg.rows)
            .output(cfg.output.clone())
            .build()
    }

    /// Number of minute rows retained.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Execute one run stamped with the wall clock.
    ///
    /// # Errors
    /// See [`run_at`](Self::run_at).
    pub async fn run(&self) -> Result<RunReport, SpreadError> {
        self.run_at(Utc::now()).await
    }

    /// Execute one run as of `now`.
    ///
    /// Source failures never fail the run: the failing source contributes no minutes
    /// and its error is recorded in the report. The dataset is written even when both
    /// sources fail.
    ///
    /// # Errors
    /// Returns `Persistence` when the previous dataset cannot be read or the new one
    /// cannot be written.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "spreadwatch::run", skip(self), fields(rows = self.rows))
    )]
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<RunReport, SpreadError> {
        let range = MinuteRange::ending_before(now, self.rows);
        let previous = self.store.load()?;

        let req_a = self.request(&self.source_a, &range);
        let req_b = self.request(&self.source_b, &range);
        let (res_a, res_b) = futures::join!(
            self.source_a.source.fetch(&req_a),
            self.source_b.source.fetch(&req_b),
        );
        let (minutes_a, report_a) = settle(&self.source_a, res_a, &range);
        let (minutes_b, report_b) = settle(&self.source_b, res_b, &range);

        let fresh = merge_minutes(&minutes_a, &minutes_b, now);
        let rows_refreshed = fresh.len();
        let dataset = reconcile(previous, fresh, self.rows);
        self.store.save(&dataset)?;

        let report = RunReport {
            updated_at: now,
            rows_written: dataset.len(),
            rows_refreshed,
            first_ts: dataset.first().map(|r| r.minute),
            last_ts: dataset.last().map(|r| r.minute),
            sources: vec![report_a, report_b],
        };
        #[cfg(feature = "tracing")]
        tracing::info!(
            rows_written = report.rows_written,
            rows_refreshed = report.rows_refreshed,
            first_ts = ?report.first_ts,
            last_ts = ?report.last_ts,
            "dataset updated"
        );
        Ok(report)
    }

    fn request(&self, slot: &SourceSlot, range: &MinuteRange) -> CandleRequest {
        CandleRequest {
            symbol: slot.symbol.clone(),
            resolution: self.resolution.clone(),
            start: range.first,
            end: range.end,
            limit: self.rows.saturating_add(LIMIT_HEADROOM),
        }
    }
}

fn settle(
    slot: &SourceSlot,
    result: Result<Vec<Candle>, SpreadError>,
    range: &MinuteRange,
) -> (MinuteSeries, SourceReport) {
    let name = slot.source.name().to_string();
    match result {
        Ok(candles) => {
            let minutes = range.clip(align_to_minutes(candles));
            let report = SourceReport {
                name,
                minutes: minutes.len(),
                error: None,
            };
            (minutes, report)
        }
        Err(e) => {
            #[cfg(feature = "tracing")]
            log_skipped(&name, &e);
            let report = SourceReport {
                name,
                minutes: 0,
                error: Some(e),
            };
            (MinuteSeries::new(), report)
        }
    }
}

#[cfg(feature = "tracing")]
fn log_skipped(name: &str, e: &SpreadError) {
    match e.root_cause() {
        SpreadError::MalformedResponse {
            expected, received, ..
        } => tracing::warn!(
            connector = %name,
            expected = %expected,
            received = %received,
            "malformed response; source skipped this run"
        ),
        _ => tracing::warn!(
            connector = %name,
            error = %e,
            "fetch failed; source skipped this run"
        ),
    }
}
