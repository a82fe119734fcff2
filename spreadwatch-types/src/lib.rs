//! Spreadwatch-specific data transfer objects and configuration primitives.
#![warn(missing_docs)]

mod config;
mod connector;
mod error;
mod reports;

pub use config::{
    OutputConfig, ProviderConfig, RetryConfig, SpreadConfig, DEFAULT_OUTPUT_STEM,
};
pub use connector::ConnectorKey;
pub use error::SpreadError;
pub use reports::{RunReport, SourceReport};
