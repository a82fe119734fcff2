#![doc = include_str!("../README.md")]
//! spreadwatch-middleware
//!
//! Re-exports for middleware wrappers.

mod builder;
mod retry;

pub use crate::builder::SourceBuilder;
pub use crate::retry::{RetryMiddleware, RetryPredicate, RetryingSource};
