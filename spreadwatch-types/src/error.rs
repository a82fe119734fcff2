use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the spreadwatch workspace.
///
/// Source-side failures (everything except `Persistence` and `InvalidArg`) are
/// degraded by the orchestrator to "no data from this source this run". The two
/// local variants are fatal for a run.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SpreadError {
    /// Transient provider failure: connection error, 5xx, or rate limiting.
    #[error("{connector} unavailable: {msg}")]
    SourceUnavailable {
        /// Connector name that failed.
        connector: String,
        /// Human-readable error message.
        msg: String,
    },

    /// A single provider request exceeded the configured timeout.
    #[error("{connector} timed out")]
    ProviderTimeout {
        /// Connector name that timed out.
        connector: String,
    },

    /// The provider refuses to serve the caller's network region (HTTP 451).
    #[error("{connector} blocked this network region (status {status})")]
    RegionBlocked {
        /// Connector name that refused the request.
        connector: String,
        /// HTTP status returned by the provider.
        status: u16,
    },

    /// The provider rejected the request with a non-retryable client error.
    #[error("{connector} rejected request (status {status}): {msg}")]
    Rejected {
        /// Connector name that rejected the request.
        connector: String,
        /// HTTP status returned by the provider.
        status: u16,
        /// Response body excerpt or reason.
        msg: String,
    },

    /// The provider answered with a payload of unexpected shape.
    #[error("{connector} returned malformed response: expected {expected}, received {received}")]
    MalformedResponse {
        /// Connector name that produced the payload.
        connector: String,
        /// Description of the expected shape.
        expected: String,
        /// Description of what was actually received.
        received: String,
    },

    /// Every retry attempt failed; carries the last underlying failure.
    #[error("{connector} failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Connector name that was retried.
        connector: String,
        /// Number of attempts performed.
        attempts: u32,
        /// The failure returned by the final attempt.
        last: Box<SpreadError>,
    },

    /// Reading or writing the persisted dataset failed.
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// Invalid input argument or configuration value.
    #[error("invalid argument: {0}")]
    InvalidArg(String),
}

impl SpreadError {
    /// Helper: build a `SourceUnavailable` error with the connector name and message.
    pub fn unavailable(connector: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            connector: connector.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `ProviderTimeout` error.
    pub fn provider_timeout(connector: impl Into<String>) -> Self {
        Self::ProviderTimeout {
            connector: connector.into(),
        }
    }

    /// Helper: build a `MalformedResponse` error.
    pub fn malformed(
        connector: impl Into<String>,
        expected: impl Into<String>,
        received: impl Into<String>,
    ) -> Self {
        Self::MalformedResponse {
            connector: connector.into(),
            expected: expected.into(),
            received: received.into(),
        }
    }

    /// Map a non-success HTTP status to the matching variant.
    ///
    /// - 451 → `RegionBlocked`
    /// - 408, 429, and 5xx → `SourceUnavailable`
    /// - any other status → `Rejected`
    pub fn from_status(connector: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        let connector = connector.into();
        match status {
            451 => Self::RegionBlocked { connector, status },
            408 | 429 | 500..=599 => Self::SourceUnavailable {
                connector,
                msg: format!("status {status}: {}", body.into()),
            },
            _ => Self::Rejected {
                connector,
                status,
                msg: body.into(),
            },
        }
    }

    /// Returns true if repeating the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::SourceUnavailable { .. } | Self::ProviderTimeout { .. }
        )
    }

    /// Returns true for failures originating at a data source.
    ///
    /// These degrade to absent data instead of aborting a run.
    #[must_use]
    pub const fn is_source_failure(&self) -> bool {
        !matches!(self, Self::Persistence(_) | Self::InvalidArg(_))
    }

    /// Name of the connector the failure is attributed to, if any.
    #[must_use]
    pub fn connector(&self) -> Option<&str> {
        match self {
            Self::SourceUnavailable { connector, .. }
            | Self::ProviderTimeout { connector }
            | Self::RegionBlocked { connector, .. }
            | Self::Rejected { connector, .. }
            | Self::MalformedResponse { connector, .. }
            | Self::RetriesExhausted { connector, .. } => Some(connector),
            Self::Persistence(_) | Self::InvalidArg(_) => None,
        }
    }

    /// Unwrap `RetriesExhausted` down to the last underlying failure.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::RetriesExhausted { last, .. } => last.root_cause(),
            other => other,
        }
    }
}

impl From<std::io::Error> for SpreadError {
    fn from(e: std::io::Error) -> Self {
        Self::Persistence(e.to_string())
    }
}
