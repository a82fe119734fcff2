//! `reqwest` plumbing shared by the provider adapters.
//!
//! Transport failures, non-success statuses, and undecodable bodies all come back as
//! source-side [`SpreadError`]s attributed to the calling connector.

use std::time::Duration;

use serde_json::Value;

use crate::types::SpreadError;

const USER_AGENT: &str = concat!("spreadwatch/", env!("CARGO_PKG_VERSION"));

/// Longest body excerpt carried in an error message, in characters.
pub const BODY_EXCERPT: usize = 200;

/// Client with a per-request `timeout` and the spreadwatch user agent.
///
/// # Errors
/// Returns `InvalidArg` if the TLS backend or client cannot be initialised.
pub fn client(connector: &str, timeout: Duration) -> Result<reqwest::Client, SpreadError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| SpreadError::InvalidArg(format!("http client for {connector}: {e}")))
}

/// Map a `reqwest` failure: timeouts to `ProviderTimeout`, anything else to
/// `SourceUnavailable`.
#[must_use]
pub fn transport_error(connector: &str, e: &reqwest::Error) -> SpreadError {
    if e.is_timeout() {
        SpreadError::provider_timeout(connector)
    } else {
        SpreadError::unavailable(connector, e.to_string())
    }
}

/// First [`BODY_EXCERPT`] characters of `body`.
#[must_use]
pub fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT).collect()
}

/// Send `request` and decode a successful response body as JSON.
///
/// # Errors
/// - transport failures per [`transport_error`]
/// - non-success statuses per [`SpreadError::from_status`], with a body excerpt
/// - `MalformedResponse` when the body is not JSON
pub async fn get_json(
    connector: &str,
    request: reqwest::RequestBuilder,
) -> Result<Value, SpreadError> {
    let resp = request
        .send()
        .await
        .map_err(|e| transport_error(connector, &e))?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(SpreadError::from_status(
            connector,
            status.as_u16(),
            excerpt(&body),
        ));
    }

    let body = resp
        .text()
        .await
        .map_err(|e| transport_error(connector, &e))?;
    serde_json::from_str(&body).map_err(|e| {
        SpreadError::malformed(connector, "JSON body", format!("{e}: {}", excerpt(&body)))
    })
}
