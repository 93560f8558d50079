//! Background scrape scheduler.
//!
//! An hourly cron job, anchored to the configured timezone, walks every
//! active offer in sequence and records one snapshot per offer. Sequential
//! processing with a fixed inter-offer pause is deliberate politeness toward
//! the scraped target, not a limitation. Ticks missed while the process is
//! down are skipped, never backfilled — the active flag on `offers` is the
//! only source of truth for what to scrape next.

use std::sync::Arc;
use std::time::Duration;

use offerwatch_scraper::ScrapeEngine;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::scrape::scrape_and_store;

/// At minute 0 of every hour, in the configured timezone.
const HOURLY: &str = "0 0 * * * *";

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process — dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    engine: Arc<ScrapeEngine>,
    config: Arc<offerwatch_core::AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let delay = Duration::from_millis(config.scheduler_inter_offer_delay_ms);
    let timezone = config.scheduler_timezone;

    let job = Job::new_async_tz(HOURLY, timezone, move |_uuid, _lock| {
        let pool = pool.clone();
        let engine = Arc::clone(&engine);

        Box::pin(async move {
            tracing::info!("scheduler: starting hourly offer scrape cycle");
            run_scrape_cycle(&pool, &engine, delay).await;
            tracing::info!("scheduler: hourly offer scrape cycle complete");
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

/// Scrapes every active offer once, in sequence.
///
/// Isolation between offers is absolute: a scrape that exhausts its retries
/// becomes a `failed` snapshot, and even a snapshot insert failure only logs
/// and moves on — no offer can block another's scheduled scrape.
pub(crate) async fn run_scrape_cycle(
    pool: &PgPool,
    engine: &ScrapeEngine,
    inter_offer_delay: Duration,
) {
    let offers = match offerwatch_db::offers::list_active_offers(pool).await {
        Ok(offers) => offers,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: failed to load active offers");
            return;
        }
    };

    if offers.is_empty() {
        tracing::info!("scheduler: no active offers; skipping cycle");
        return;
    }

    tracing::info!(count = offers.len(), "scheduler: scraping active offers");

    for offer in &offers {
        match scrape_and_store(pool, engine, offer).await {
            Ok(snapshot) => {
                tracing::info!(
                    offer_id = %offer.id,
                    offer_name = %offer.name,
                    status = %snapshot.scrape_status,
                    campaigns = snapshot.campaigns_count,
                    "scheduler: snapshot recorded"
                );
            }
            Err(e) => {
                tracing::error!(
                    offer_id = %offer.id,
                    offer_name = %offer.name,
                    error = %e,
                    "scheduler: snapshot insert failed; continuing with next offer"
                );
            }
        }

        // Pause between offers regardless of outcome.
        tokio::time::sleep(inter_offer_delay).await;
    }
}
