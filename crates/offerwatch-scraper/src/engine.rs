//! Retry/backoff wrapper around the page fetch.
//!
//! The engine is the containment boundary for every scraping failure mode:
//! whatever happens underneath, [`ScrapeEngine::scrape`] returns a
//! [`ScrapeResult`] — never an error. Callers persist the result as a
//! snapshot and move on.

use std::time::Duration;

use offerwatch_core::ScrapeStatus;
use reqwest::Client;

use crate::error::FetchError;
use crate::fetcher;
use crate::types::{ScrapeConfig, ScrapeResult};

/// Drives fetch attempts for one URL at a time with exponential backoff.
///
/// Retries are purely time-based: a page that loads but yields nothing is
/// recorded as `partial` and not retried, because a content-based retry
/// would hammer the target for a result it has already given.
pub struct ScrapeEngine {
    client: Client,
    config: ScrapeConfig,
}

impl ScrapeEngine {
    /// Creates an engine with the given policy.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(config: ScrapeConfig) -> Result<Self, FetchError> {
        let client = fetcher::build_client(config.timeout_ms, &config.user_agent)?;
        Ok(Self { client, config })
    }

    /// Scrapes `url`, retrying transient fetch failures up to the configured
    /// attempt budget.
    ///
    /// Attempt loop:
    /// 1. fetch the page; on success map the extracted fields and return —
    ///    `success` normally, `partial` when the page yielded a structurally
    ///    empty core result;
    /// 2. on fetch failure, sleep `min(base * 2^(attempt-1), cap)` if
    ///    attempts remain, then retry;
    /// 3. with the budget exhausted, return a `failed` result carrying the
    ///    last error message.
    ///
    /// A zero attempt budget fails immediately without fetching at all.
    pub async fn scrape(&self, url: &str) -> ScrapeResult {
        let max_attempts = self.config.max_retries;
        let mut last_error: Option<FetchError> = None;

        for attempt in 1..=max_attempts {
            tracing::info!(url, attempt, max_attempts, "scrape attempt");

            match fetcher::fetch(&self.client, url).await {
                Ok(fields) => {
                    let status = if fields.is_structurally_empty() {
                        ScrapeStatus::Partial
                    } else {
                        ScrapeStatus::Success
                    };
                    tracing::info!(
                        url,
                        attempt,
                        campaigns = fields.campaigns_count,
                        creatives = fields.creatives_count,
                        %status,
                        "scrape attempt finished"
                    );
                    return ScrapeResult::from_fields(fields, status);
                }
                Err(err) => {
                    tracing::warn!(url, attempt, max_attempts, error = %err, "scrape attempt failed");

                    if attempt < max_attempts {
                        let delay = backoff_delay(
                            attempt,
                            self.config.backoff_base_ms,
                            self.config.backoff_cap_ms,
                        );
                        tracing::debug!(url, delay_ms = delay.as_millis() as u64, "backing off");
                        tokio::time::sleep(delay).await;
                    }
                    last_error = Some(err);
                }
            }
        }

        let message = last_error
            .map_or_else(|| "max retries exceeded".to_string(), |e| e.to_string());
        ScrapeResult::failed(message)
    }
}

/// Delay before the attempt after `failed_attempt` (1-based):
/// `min(base * 2^(failed_attempt - 1), cap)`.
fn backoff_delay(failed_attempt: u32, base_ms: u64, cap_ms: u64) -> Duration {
    let exponent = failed_attempt.saturating_sub(1).min(62);
    let delay_ms = base_ms.saturating_mul(1u64 << exponent).min(cap_ms);
    Duration::from_millis(delay_ms)
}
