//! Database operations for the `offers` table.
//!
//! Every per-offer read and write except the scheduler's batch load is scoped
//! by `owner_id`; an offer belonging to someone else behaves exactly like a
//! missing one.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const OFFER_COLUMNS: &str =
    "id, owner_id, url, name, category, region, is_active, created_at, updated_at";

/// A row from the `offers` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OfferRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub url: String,
    pub name: String,
    pub category: String,
    pub region: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create an offer.
#[derive(Debug, Clone)]
pub struct NewOffer {
    pub owner_id: Uuid,
    pub url: String,
    pub name: String,
    pub category: String,
    pub region: String,
}

/// Optional field updates for an offer; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct OfferChanges {
    pub name: Option<String>,
    pub url: Option<String>,
    pub category: Option<String>,
    pub region: Option<String>,
    pub is_active: Option<bool>,
}

/// Optional list filters for an owner's offers.
#[derive(Debug, Clone, Default)]
pub struct OfferFilter {
    pub category: Option<String>,
    pub region: Option<String>,
}

/// Inserts a new offer (active by default) and returns the created row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_offer(pool: &PgPool, new: &NewOffer) -> Result<OfferRow, DbError> {
    let row = sqlx::query_as::<_, OfferRow>(&format!(
        "INSERT INTO offers (owner_id, url, name, category, region, is_active) \
         VALUES ($1, $2, $3, $4, $5, true) \
         RETURNING {OFFER_COLUMNS}"
    ))
    .bind(new.owner_id)
    .bind(&new.url)
    .bind(&new.name)
    .bind(&new.category)
    .bind(&new.region)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns all active offers across every owner, oldest first.
///
/// This is the scheduler's batch load; it deliberately ignores ownership.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_offers(pool: &PgPool) -> Result<Vec<OfferRow>, DbError> {
    let rows = sqlx::query_as::<_, OfferRow>(&format!(
        "SELECT {OFFER_COLUMNS} FROM offers WHERE is_active = true ORDER BY created_at, id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns one page of an owner's offers, newest first, with optional
/// category/region filters.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_offers(
    pool: &PgPool,
    owner_id: Uuid,
    filter: &OfferFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<OfferRow>, DbError> {
    let rows = sqlx::query_as::<_, OfferRow>(&format!(
        "SELECT {OFFER_COLUMNS} FROM offers \
         WHERE owner_id = $1 \
           AND ($2::text IS NULL OR category = $2) \
           AND ($3::text IS NULL OR region = $3) \
         ORDER BY created_at DESC, id DESC \
         LIMIT $4 OFFSET $5"
    ))
    .bind(owner_id)
    .bind(filter.category.as_deref())
    .bind(filter.region.as_deref())
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Counts an owner's offers under the same filters as [`list_offers`],
/// independent of the page slice.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_offers(
    pool: &PgPool,
    owner_id: Uuid,
    filter: &OfferFilter,
) -> Result<i64, DbError> {
    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM offers \
         WHERE owner_id = $1 \
           AND ($2::text IS NULL OR category = $2) \
           AND ($3::text IS NULL OR region = $3)",
    )
    .bind(owner_id)
    .bind(filter.category.as_deref())
    .bind(filter.region.as_deref())
    .fetch_one(pool)
    .await?;

    Ok(total)
}

/// Returns an owner's offer by id, or `None` when missing or foreign.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_offer(
    pool: &PgPool,
    offer_id: Uuid,
    owner_id: Uuid,
) -> Result<Option<OfferRow>, DbError> {
    let row = sqlx::query_as::<_, OfferRow>(&format!(
        "SELECT {OFFER_COLUMNS} FROM offers WHERE id = $1 AND owner_id = $2"
    ))
    .bind(offer_id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns an offer by id regardless of owner.
///
/// Used by the background scrape paths, where ownership was already verified
/// by whoever queued the work.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_offer_by_id(pool: &PgPool, offer_id: Uuid) -> Result<Option<OfferRow>, DbError> {
    let row = sqlx::query_as::<_, OfferRow>(&format!(
        "SELECT {OFFER_COLUMNS} FROM offers WHERE id = $1"
    ))
    .bind(offer_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Applies the non-`None` fields of `changes` to an owner's offer and
/// returns the updated row, or `None` when the offer is missing or foreign.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn update_offer(
    pool: &PgPool,
    offer_id: Uuid,
    owner_id: Uuid,
    changes: &OfferChanges,
) -> Result<Option<OfferRow>, DbError> {
    let row = sqlx::query_as::<_, OfferRow>(&format!(
        "UPDATE offers SET \
             name       = COALESCE($3, name), \
             url        = COALESCE($4, url), \
             category   = COALESCE($5, category), \
             region     = COALESCE($6, region), \
             is_active  = COALESCE($7, is_active), \
             updated_at = NOW() \
         WHERE id = $1 AND owner_id = $2 \
         RETURNING {OFFER_COLUMNS}"
    ))
    .bind(offer_id)
    .bind(owner_id)
    .bind(changes.name.as_deref())
    .bind(changes.url.as_deref())
    .bind(changes.category.as_deref())
    .bind(changes.region.as_deref())
    .bind(changes.is_active)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Deletes an owner's offer; snapshots go with it via `ON DELETE CASCADE`.
///
/// Returns `true` when a row was actually deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_offer(pool: &PgPool, offer_id: Uuid, owner_id: Uuid) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM offers WHERE id = $1 AND owner_id = $2")
        .bind(offer_id)
        .bind(owner_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
