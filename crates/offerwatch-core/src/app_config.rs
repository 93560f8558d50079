use std::net::SocketAddr;

use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Owner attributed to requests when bearer auth is disabled (development only).
    pub dev_owner_id: Uuid,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub scraper_timeout_ms: u64,
    pub scraper_user_agent: String,
    /// Total fetch attempts per scrape (not additional retries).
    pub scraper_max_retries: u32,
    pub scraper_backoff_base_ms: u64,
    pub scraper_backoff_cap_ms: u64,
    /// Pause between consecutive offers inside one scheduled cycle.
    pub scheduler_inter_offer_delay_ms: u64,
    /// Named timezone the hourly cron is anchored to.
    pub scheduler_timezone: chrono_tz::Tz,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("dev_owner_id", &self.dev_owner_id)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("scraper_timeout_ms", &self.scraper_timeout_ms)
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field("scraper_max_retries", &self.scraper_max_retries)
            .field("scraper_backoff_base_ms", &self.scraper_backoff_base_ms)
            .field("scraper_backoff_cap_ms", &self.scraper_backoff_cap_ms)
            .field(
                "scheduler_inter_offer_delay_ms",
                &self.scheduler_inter_offer_delay_ms,
            )
            .field("scheduler_timezone", &self.scheduler_timezone)
            .finish()
    }
}
