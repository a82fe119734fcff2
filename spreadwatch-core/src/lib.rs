//! spreadwatch-core
//!
//! Core types, traits, and utilities shared across the spreadwatch workspace.
//!
//! - `types`: candle, comparison row, and request records.
//! - `connector`: the `CandleSource` trait implemented by provider connectors.
//! - `middleware`: the `Middleware` trait implemented by connector wrappers.
//! - `http` (feature `http`): `reqwest` client setup and response mapping for adapters.
//! - `payload`: lenient readers for provider JSON (closes, epoch timestamps).
//! - `timeseries`: minute alignment, outer-join merge, and rolling-window reconcile.
//!
//! Everything under `timeseries` is pure: no I/O, no clock access. The run instant
//! is always injected by the caller.
#![warn(missing_docs)]

/// Candle source trait and connector metadata.
pub mod connector;
/// Shared HTTP request and response handling for adapters.
#[cfg(feature = "http")]
pub mod http;
/// Middleware trait implemented by connector wrappers.
pub mod middleware;
pub mod payload;
/// Minute time-series utilities: align, merge, reconcile.
pub mod timeseries;
pub mod types;

pub use connector::CandleSource;
pub use middleware::Middleware;
pub use timeseries::align::align_to_minutes;
pub use timeseries::merge::{PERCENT_DP, SIGNIFICANT_DIGITS, build_row, merge_minutes};
pub use timeseries::rolling::reconcile;
pub use timeseries::util::{MinuteRange, floor_to_minute};
pub use types::*;
