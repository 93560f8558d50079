//! Offer CRUD and on-demand scrape trigger handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use offerwatch_core::{metrics, OfferCategory, OfferRegion};
use offerwatch_db::{offers, snapshots, DbError, NewOffer, OfferChanges, OfferFilter, OfferRow};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    map_db_error, normalize_limit, normalize_offset, ApiError, ApiResponse, AppState, ResponseMeta,
};
use crate::middleware::{OwnerId, RequestId};
use crate::scrape::spawn_scrape;

/// An offer as returned by the API, with its latest observation and the
/// trailing-24h campaign delta attached.
#[derive(Debug, Serialize)]
pub(super) struct OfferItem {
    pub id: Uuid,
    pub url: String,
    pub name: String,
    pub category: String,
    pub region: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub latest_snapshot: Option<SnapshotItem>,
    pub delta_24h: Option<metrics::Delta24h>,
}

/// A snapshot as returned by the API.
#[derive(Debug, Serialize)]
pub(super) struct SnapshotItem {
    pub id: Uuid,
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

impl From<snapshots::SnapshotRow> for SnapshotItem {
    fn from(row: snapshots::SnapshotRow) -> Self {
        Self {
            id: row.id,
            captured_at: row.captured_at,
            campaigns_count: row.campaigns_count,
            creatives_count: row.creatives_count,
            impressions: row.impressions,
            reach: row.reach,
            campaign_start_date: row.campaign_start_date,
            campaign_end_date: row.campaign_end_date,
            ad_texts: row.ad_texts,
            page_name: row.page_name,
            scrape_status: row.scrape_status,
            error_message: row.error_message,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct OfferListData {
    pub offers: Vec<OfferItem>,
    pub total: i64,
}

#[derive(Debug, Deserialize)]
pub(super) struct ListOffersQuery {
    category: Option<String>,
    region: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateOfferBody {
    url: String,
    name: String,
    category: OfferCategory,
    region: OfferRegion,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateOfferBody {
    name: Option<String>,
    url: Option<String>,
    category: Option<OfferCategory>,
    region: Option<OfferRegion>,
    is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
struct ScrapeQueuedData {
    offer_id: Uuid,
    queued: bool,
}

#[derive(Debug, Serialize)]
struct DeletedData {
    offer_id: Uuid,
    deleted: bool,
}

fn validate_url(req_id: &str, url: &str) -> Result<(), ApiError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ApiError::new(
            req_id.to_owned(),
            "validation_error",
            "url must start with http:// or https://",
        ))
    }
}

fn validate_name(req_id: &str, name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        Err(ApiError::new(
            req_id.to_owned(),
            "validation_error",
            "name must not be empty",
        ))
    } else {
        Ok(())
    }
}

fn not_found(req_id: String) -> ApiError {
    ApiError::new(req_id, "not_found", "offer not found")
}

/// Loads an offer's latest snapshot and, when one exists, the delta against
/// the earliest snapshot of the trailing 24 hours.
async fn latest_and_delta(
    pool: &PgPool,
    offer_id: Uuid,
) -> Result<(Option<SnapshotItem>, Option<metrics::Delta24h>), DbError> {
    let Some(latest) = snapshots::latest_snapshot(pool, offer_id).await? else {
        return Ok((None, None));
    };

    let cutoff = metrics::delta_window_start(Utc::now());
    let reference = snapshots::earliest_snapshot_since(pool, offer_id, cutoff).await?;

    let delta = metrics::delta_24h(
        &metrics::CountObservation {
            captured_at: latest.captured_at,
            campaigns_count: latest.campaigns_count,
            creatives_count: latest.creatives_count,
        },
        reference
            .map(|r| metrics::CountObservation {
                captured_at: r.captured_at,
                campaigns_count: r.campaigns_count,
                creatives_count: r.creatives_count,
            })
            .as_ref(),
    );

    Ok((Some(SnapshotItem::from(latest)), delta))
}

async fn offer_item(pool: &PgPool, row: OfferRow) -> Result<OfferItem, DbError> {
    let (latest_snapshot, delta_24h) = latest_and_delta(pool, row.id).await?;
    Ok(OfferItem {
        id: row.id,
        url: row.url,
        name: row.name,
        category: row.category,
        region: row.region,
        is_active: row.is_active,
        created_at: row.created_at,
        updated_at: row.updated_at,
        latest_snapshot,
        delta_24h,
    })
}

fn parse_filter(req_id: &str, query: &ListOffersQuery) -> Result<OfferFilter, ApiError> {
    let category = match query.category.as_deref() {
        Some(raw) => Some(
            OfferCategory::parse(raw)
                .ok_or_else(|| {
                    ApiError::new(req_id.to_owned(), "validation_error", "unknown category")
                })?
                .as_str()
                .to_owned(),
        ),
        None => None,
    };
    let region = match query.region.as_deref() {
        Some(raw) => Some(
            OfferRegion::parse(raw)
                .ok_or_else(|| {
                    ApiError::new(req_id.to_owned(), "validation_error", "unknown region")
                })?
                .as_str()
                .to_owned(),
        ),
        None => None,
    };

    Ok(OfferFilter { category, region })
}

pub(super) async fn list_offers(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(OwnerId(owner_id)): Extension<OwnerId>,
    Query(query): Query<ListOffersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = parse_filter(&req_id.0, &query)?;
    let limit = normalize_limit(query.limit);
    let offset = normalize_offset(query.offset);

    let rows = offers::list_offers(&state.pool, owner_id, &filter, limit, offset)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let total = offers::count_offers(&state.pool, owner_id, &filter)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        items.push(
            offer_item(&state.pool, row)
                .await
                .map_err(|e| map_db_error(req_id.0.clone(), &e))?,
        );
    }

    Ok(Json(ApiResponse {
        data: OfferListData {
            offers: items,
            total,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn create_offer(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(OwnerId(owner_id)): Extension<OwnerId>,
    Json(body): Json<CreateOfferBody>,
) -> Result<impl IntoResponse, ApiError> {
    validate_url(&req_id.0, &body.url)?;
    validate_name(&req_id.0, &body.name)?;

    let row = offers::create_offer(
        &state.pool,
        &NewOffer {
            owner_id,
            url: body.url,
            name: body.name.trim().to_owned(),
            category: body.category.as_str().to_owned(),
            region: body.region.as_str().to_owned(),
        },
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(offer_id = %row.id, name = %row.name, "offer created");

    // First data point as soon as possible instead of waiting for the hour.
    spawn_scrape(state.pool.clone(), state.engine.clone(), row.id);

    let item = offer_item(&state.pool, row)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: item,
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub(super) async fn get_offer(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(OwnerId(owner_id)): Extension<OwnerId>,
    Path(offer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = offers::get_offer(&state.pool, offer_id, owner_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| not_found(req_id.0.clone()))?;

    let item = offer_item(&state.pool, row)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: item,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn update_offer(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(OwnerId(owner_id)): Extension<OwnerId>,
    Path(offer_id): Path<Uuid>,
    Json(body): Json<UpdateOfferBody>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(url) = body.url.as_deref() {
        validate_url(&req_id.0, url)?;
    }
    if let Some(name) = body.name.as_deref() {
        validate_name(&req_id.0, name)?;
    }

    let changes = OfferChanges {
        name: body.name.map(|n| n.trim().to_owned()),
        url: body.url,
        category: body.category.map(|c| c.as_str().to_owned()),
        region: body.region.map(|r| r.as_str().to_owned()),
        is_active: body.is_active,
    };

    let row = offers::update_offer(&state.pool, offer_id, owner_id, &changes)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| not_found(req_id.0.clone()))?;

    let item = offer_item(&state.pool, row)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: item,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn delete_offer(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(OwnerId(owner_id)): Extension<OwnerId>,
    Path(offer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = offers::delete_offer(&state.pool, offer_id, owner_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    if !deleted {
        return Err(not_found(req_id.0));
    }

    tracing::info!(%offer_id, "offer deleted");

    Ok(Json(ApiResponse {
        data: DeletedData {
            offer_id,
            deleted: true,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn trigger_scrape(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(OwnerId(owner_id)): Extension<OwnerId>,
    Path(offer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    // Ownership is verified here; the background task re-reads by id only.
    let offer = offers::get_offer(&state.pool, offer_id, owner_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| not_found(req_id.0.clone()))?;

    spawn_scrape(state.pool.clone(), state.engine.clone(), offer.id);

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse {
            data: ScrapeQueuedData {
                offer_id: offer.id,
                queued: true,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
