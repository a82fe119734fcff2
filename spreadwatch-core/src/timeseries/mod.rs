//! Minute time-series utilities shared by connectors and the orchestrator.
//!
//! Modules include:
//! - `align`: truncate raw candles to minutes, keeping the latest per minute
//! - `merge`: outer-join two minute series into comparison rows
//! - `rolling`: overlay fresh rows onto a persisted dataset and cap its length
//! - `util`: minute flooring and the fetch window
/// Minute alignment of raw provider candles.
pub mod align;
/// Outer-join merge producing comparison rows.
pub mod merge;
/// Rolling-window reconciliation of persisted and fresh rows.
pub mod rolling;
/// Minute flooring and range helpers.
pub mod util;
