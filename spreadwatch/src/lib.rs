//! Spreadwatch keeps a rolling, minute-by-minute comparison of two price feeds.
//!
//! Overview
//! - Source A (reference) is Binance USD-M futures mark-price klines; source B is
//!   Reya candle history. Any pair of `CandleSource`s can be plugged in.
//! - Each run fetches the window `[now - rows min, now)` from both sources
//!   concurrently, aligns candles to minute boundaries, outer-joins them, and overlays
//!   the result on the previously persisted dataset.
//! - The dataset keeps at most `rows` minutes and is written as CSV and JSON with
//!   atomic replacement.
//!
//! Key behaviors
//! - A failing source never fails the run. Its minutes are simply absent this time,
//!   and rows it left out keep whatever the previous run recorded.
//! - Only local problems (unreadable or unwritable dataset, bad configuration) are
//!   errors.
//! - The still-open current minute is never written.
//!
//! ```rust,ignore
//! use spreadwatch::{Spreadwatch, SpreadConfig};
//!
//! let cfg = SpreadConfig::from_env()?;
//! let report = Spreadwatch::from_config(&cfg)?.run().await?;
//! println!("{} rows", report.rows_written);
//! ```

mod core;
/// Dataset persistence.
pub mod persist;

pub use crate::core::{LIMIT_HEADROOM, Spreadwatch, SpreadwatchBuilder};
pub use crate::persist::{CSV_HEADER, DatasetStore, FileStore};

pub use spreadwatch_core::{
    ComparisonRow, OutputConfig, ProviderConfig, RetryConfig, RunReport, SourceReport,
    SpreadConfig, SpreadError,
};
