//! Database operations for the `offer_snapshots` table.
//!
//! The table is append-only: one insert per scrape attempt outcome, no
//! updates, no per-row deletes. Rows disappear only through the cascade when
//! the parent offer is deleted.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const SNAPSHOT_COLUMNS: &str = "id, offer_id, captured_at, campaigns_count, creatives_count, \
     impressions, reach, campaign_start_date, campaign_end_date, ad_texts, page_name, \
     scrape_status, error_message, created_at";

/// A row from the `offer_snapshots` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SnapshotRow {
    pub id: Uuid,
    pub offer_id: Uuid,
    pub captured_at: DateTime<Utc>,
    pub campaigns_count: i32,
    pub creatives_count: i32,
    pub impressions: Option<i64>,
    pub reach: Option<i64>,
    pub campaign_start_date: Option<DateTime<Utc>>,
    pub campaign_end_date: Option<DateTime<Utc>>,
    /// JSON array of ad-copy text fragments.
    pub ad_texts: Option<serde_json::Value>,
    pub page_name: Option<String>,
    pub scrape_status: String,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields for one snapshot insert; `captured_at` is stamped by the caller so
/// the observation time is the scrape time, not the insert time.
#[derive(Debug, Clone)]
pub struct NewSnapshot {
    pub offer_id: Uuid,
    pub captured_at: DateTime<Utc>,
    pub campaigns_count: i32,
    pub creatives_count: i32,
    pub impressions: Option<i64>,
    pub reach: Option<i64>,
    pub campaign_start_date: Option<DateTime<Utc>>,
    pub campaign_end_date: Option<DateTime<Utc>>,
    pub ad_texts: Option<serde_json::Value>,
    pub page_name: Option<String>,
    pub scrape_status: String,
    pub error_message: Option<String>,
}

/// Inserts one snapshot and returns the stored row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (e.g., the parent offer was
/// deleted between scrape and persist).
pub async fn insert_snapshot(pool: &PgPool, new: &NewSnapshot) -> Result<SnapshotRow, DbError> {
    let row = sqlx::query_as::<_, SnapshotRow>(&format!(
        "INSERT INTO offer_snapshots \
             (offer_id, captured_at, campaigns_count, creatives_count, impressions, reach, \
              campaign_start_date, campaign_end_date, ad_texts, page_name, scrape_status, \
              error_message) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
         RETURNING {SNAPSHOT_COLUMNS}"
    ))
    .bind(new.offer_id)
    .bind(new.captured_at)
    .bind(new.campaigns_count)
    .bind(new.creatives_count)
    .bind(new.impressions)
    .bind(new.reach)
    .bind(new.campaign_start_date)
    .bind(new.campaign_end_date)
    .bind(new.ad_texts.as_ref())
    .bind(new.page_name.as_deref())
    .bind(&new.scrape_status)
    .bind(new.error_message.as_deref())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns the snapshot with the maximum `captured_at` for an offer, or
/// `None` when the offer has never been scraped.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn latest_snapshot(
    pool: &PgPool,
    offer_id: Uuid,
) -> Result<Option<SnapshotRow>, DbError> {
    let row = sqlx::query_as::<_, SnapshotRow>(&format!(
        "SELECT {SNAPSHOT_COLUMNS} FROM offer_snapshots \
         WHERE offer_id = $1 \
         ORDER BY captured_at DESC, id DESC \
         LIMIT 1"
    ))
    .bind(offer_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns the earliest snapshot at or after `cutoff` — the 24h-delta
/// reference point when `cutoff = now - 24h`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn earliest_snapshot_since(
    pool: &PgPool,
    offer_id: Uuid,
    cutoff: DateTime<Utc>,
) -> Result<Option<SnapshotRow>, DbError> {
    let row = sqlx::query_as::<_, SnapshotRow>(&format!(
        "SELECT {SNAPSHOT_COLUMNS} FROM offer_snapshots \
         WHERE offer_id = $1 AND captured_at >= $2 \
         ORDER BY captured_at ASC, id ASC \
         LIMIT 1"
    ))
    .bind(offer_id)
    .bind(cutoff)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns all snapshots at or after `cutoff`, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_snapshots_since(
    pool: &PgPool,
    offer_id: Uuid,
    cutoff: DateTime<Utc>,
) -> Result<Vec<SnapshotRow>, DbError> {
    let rows = sqlx::query_as::<_, SnapshotRow>(&format!(
        "SELECT {SNAPSHOT_COLUMNS} FROM offer_snapshots \
         WHERE offer_id = $1 AND captured_at >= $2 \
         ORDER BY captured_at DESC, id DESC"
    ))
    .bind(offer_id)
    .bind(cutoff)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns one limit/offset page of an offer's history, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_snapshots_page(
    pool: &PgPool,
    offer_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<SnapshotRow>, DbError> {
    let rows = sqlx::query_as::<_, SnapshotRow>(&format!(
        "SELECT {SNAPSHOT_COLUMNS} FROM offer_snapshots \
         WHERE offer_id = $1 \
         ORDER BY captured_at DESC, id DESC \
         LIMIT $2 OFFSET $3"
    ))
    .bind(offer_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Counts all snapshots for an offer, independent of any page slice.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_snapshots(pool: &PgPool, offer_id: Uuid) -> Result<i64, DbError> {
    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM offer_snapshots WHERE offer_id = $1",
    )
    .bind(offer_id)
    .fetch_one(pool)
    .await?;

    Ok(total)
}
