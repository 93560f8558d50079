//! Page fetch: URL in, best-effort [`RawFields`] or [`FetchError`] out.
//!
//! Each call owns its request and response end to end; nothing survives the
//! function scope, so a failed attempt can never leak connection state into
//! the next one.

use std::time::Duration;

use reqwest::Client;

use crate::error::FetchError;
use crate::extract::extract_fields;
use crate::types::RawFields;

/// Builds the HTTP client used for all fetch attempts.
///
/// The timeout applies per request, i.e. per attempt — the engine's retry
/// loop multiplies it, not this client.
///
/// # Errors
///
/// Returns [`FetchError::Http`] if the client cannot be constructed.
pub fn build_client(timeout_ms: u64, user_agent: &str) -> Result<Client, FetchError> {
    let client = Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}

/// Loads `url` and extracts whatever fields the page yields.
///
/// Extraction itself is infallible; only failure to load the page at all
/// (network error, timeout, non-2xx status) is a [`FetchError`].
///
/// # Errors
///
/// - [`FetchError::Http`] — connect failure, TLS failure, or timeout.
/// - [`FetchError::UnexpectedStatus`] — the server answered with a non-2xx
///   status.
pub async fn fetch(client: &Client, url: &str) -> Result<RawFields, FetchError> {
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let body = response.text().await?;
    Ok(extract_fields(&body))
}
