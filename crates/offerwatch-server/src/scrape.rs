//! Shared scrape-and-persist path.
//!
//! Both the hourly scheduler and the on-demand trigger funnel through
//! [`scrape_and_store`], so an offer gets exactly one snapshot per scrape
//! regardless of which path asked for it.

use std::sync::Arc;

use chrono::Utc;
use offerwatch_db::{snapshots, DbError, NewSnapshot, OfferRow, SnapshotRow};
use offerwatch_scraper::{ScrapeEngine, ScrapeResult};
use sqlx::PgPool;
use uuid::Uuid;

/// Scrapes one offer and appends the outcome as a snapshot.
///
/// The scrape itself cannot fail — the engine converts every failure mode
/// into a `failed` result. Only the snapshot insert can error.
///
/// # Errors
///
/// Returns [`DbError`] if the snapshot insert fails.
pub(crate) async fn scrape_and_store(
    pool: &PgPool,
    engine: &ScrapeEngine,
    offer: &OfferRow,
) -> Result<SnapshotRow, DbError> {
    let result = engine.scrape(&offer.url).await;
    let new_snapshot = snapshot_from_result(offer.id, result);
    snapshots::insert_snapshot(pool, &new_snapshot).await
}

/// Queues a one-off scrape for a single offer and returns immediately.
///
/// The caller gets no completion signal; failures (offer vanished, scrape
/// exhausted, insert failed) are logged and otherwise invisible — the next
/// successful run simply produces the next data point.
pub(crate) fn spawn_scrape(pool: PgPool, engine: Arc<ScrapeEngine>, offer_id: Uuid) {
    tokio::spawn(async move {
        let offer = match offerwatch_db::offers::get_offer_by_id(&pool, offer_id).await {
            Ok(Some(offer)) => offer,
            Ok(None) => {
                tracing::warn!(%offer_id, "on-demand scrape: offer no longer exists");
                return;
            }
            Err(e) => {
                tracing::error!(%offer_id, error = %e, "on-demand scrape: offer lookup failed");
                return;
            }
        };

        match scrape_and_store(&pool, &engine, &offer).await {
            Ok(snapshot) => {
                tracing::info!(
                    %offer_id,
                    snapshot_id = %snapshot.id,
                    status = %snapshot.scrape_status,
                    "on-demand scrape finished"
                );
            }
            Err(e) => {
                tracing::error!(%offer_id, error = %e, "on-demand scrape: snapshot insert failed");
            }
        }
    });
}

/// Maps a [`ScrapeResult`] 1:1 onto a snapshot insert, stamping the current
/// time as the observation time.
fn snapshot_from_result(offer_id: Uuid, result: ScrapeResult) -> NewSnapshot {
    NewSnapshot {
        offer_id,
        captured_at: Utc::now(),
        campaigns_count: result.campaigns_count,
        creatives_count: result.creatives_count,
        impressions: result.impressions,
        reach: result.reach,
        campaign_start_date: result.campaign_start_date,
        campaign_end_date: result.campaign_end_date,
        ad_texts: result.ad_texts.map(serde_json::Value::from),
        page_name: result.page_name,
        scrape_status: result.status.as_str().to_string(),
        error_message: result.error_message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offerwatch_core::ScrapeStatus;

    #[test]
    fn failed_result_maps_to_zero_count_snapshot() {
        let offer_id = Uuid::new_v4();
        let result = ScrapeResult::failed("navigation timeout".to_string());

        let new_snapshot = snapshot_from_result(offer_id, result);

        assert_eq!(new_snapshot.offer_id, offer_id);
        assert_eq!(new_snapshot.campaigns_count, 0);
        assert_eq!(new_snapshot.creatives_count, 0);
        assert_eq!(new_snapshot.scrape_status, ScrapeStatus::Failed.as_str());
        assert_eq!(
            new_snapshot.error_message.as_deref(),
            Some("navigation timeout")
        );
        assert!(new_snapshot.ad_texts.is_none());
    }

    #[test]
    fn ad_texts_become_a_json_array() {
        let offer_id = Uuid::new_v4();
        let mut result = ScrapeResult::failed("x".to_string());
        result.status = ScrapeStatus::Success;
        result.error_message = None;
        result.campaigns_count = 4;
        result.creatives_count = 4;
        result.ad_texts = Some(vec!["first ad copy".to_string(), "second".to_string()]);

        let new_snapshot = snapshot_from_result(offer_id, result);
        let texts = new_snapshot.ad_texts.expect("json array");
        assert_eq!(texts.as_array().map(Vec::len), Some(2));
    }
}
