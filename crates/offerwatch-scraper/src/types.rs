//! Scrape configuration, raw extraction output, and the engine's result type.

use chrono::{DateTime, Utc};
use offerwatch_core::ScrapeStatus;
use serde::Serialize;

/// Retry/timeout policy for one scrape.
///
/// Defaults mirror the values the collector has always run with: 30s page
/// timeout, 3 total attempts, backoff 1s doubling up to a 10s ceiling.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub timeout_ms: u64,
    pub user_agent: String,
    /// Total fetch attempts, including the first one. Zero means no fetch
    /// happens at all and the scrape fails immediately.
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub backoff_cap_ms: u64,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            max_retries: 3,
            backoff_base_ms: 1_000,
            backoff_cap_ms: 10_000,
        }
    }
}

impl ScrapeConfig {
    #[must_use]
    pub fn from_app_config(config: &offerwatch_core::AppConfig) -> Self {
        Self {
            timeout_ms: config.scraper_timeout_ms,
            user_agent: config.scraper_user_agent.clone(),
            max_retries: config.scraper_max_retries,
            backoff_base_ms: config.scraper_backoff_base_ms,
            backoff_cap_ms: config.scraper_backoff_cap_ms,
        }
    }
}

/// Best-effort structured fields extracted from a loaded ad-library page.
///
/// Any subset may be missing; that alone is not a failure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFields {
    pub campaigns_count: i32,
    pub creatives_count: i32,
    pub impressions: Option<i64>,
    pub reach: Option<i64>,
    pub campaign_start_date: Option<DateTime<Utc>>,
    pub campaign_end_date: Option<DateTime<Utc>>,
    pub ad_texts: Vec<String>,
    pub page_name: Option<String>,
}

impl RawFields {
    /// True when extraction found no core signal at all: no campaign count,
    /// no ad texts, no page name. Such a page loaded but told us nothing —
    /// the engine records it as `partial` rather than `success`.
    #[must_use]
    pub fn is_structurally_empty(&self) -> bool {
        self.campaigns_count == 0
            && self.creatives_count == 0
            && self.ad_texts.is_empty()
            && self.page_name.is_none()
    }
}

/// Outcome of a full scrape (all attempts). Maps 1:1 onto a snapshot row.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeResult {
    pub campaigns_count: i32,
    pub creatives_count: i32,
    pub impressions: Option<i64>,
    pub reach: Option<i64>,
    pub campaign_start_date: Option<DateTime<Utc>>,
    pub campaign_end_date: Option<DateTime<Utc>>,
    pub ad_texts: Option<Vec<String>>,
    pub page_name: Option<String>,
    pub status: ScrapeStatus,
    pub error_message: Option<String>,
}

impl ScrapeResult {
    /// Result for a scrape whose every attempt failed to load the page.
    #[must_use]
    pub fn failed(message: String) -> Self {
        Self {
            campaigns_count: 0,
            creatives_count: 0,
            impressions: None,
            reach: None,
            campaign_start_date: None,
            campaign_end_date: None,
            ad_texts: None,
            page_name: None,
            status: ScrapeStatus::Failed,
            error_message: Some(message),
        }
    }

    pub(crate) fn from_fields(fields: RawFields, status: ScrapeStatus) -> Self {
        let RawFields {
            campaigns_count,
            creatives_count,
            impressions,
            reach,
            campaign_start_date,
            campaign_end_date,
            ad_texts,
            page_name,
        } = fields;

        Self {
            campaigns_count,
            creatives_count,
            impressions,
            reach,
            campaign_start_date,
            campaign_end_date,
            ad_texts: if ad_texts.is_empty() {
                None
            } else {
                Some(ad_texts)
            },
            page_name,
            status,
            error_message: None,
        }
    }
}
