//! Snapshot history handlers: charting series and paged raw history.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use offerwatch_core::metrics;
use offerwatch_db::{offers, snapshots};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::offers::SnapshotItem;
use super::{
    map_db_error, normalize_limit, normalize_offset, ApiError, ApiResponse, AppState, ResponseMeta,
};
use crate::middleware::{OwnerId, RequestId};

const DEFAULT_SERIES_DAYS: u32 = 7;
const MAX_SERIES_DAYS: u32 = 365;

#[derive(Debug, Deserialize)]
pub(super) struct SeriesQuery {
    days: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(super) struct HistoryQuery {
    limit: Option<i64>,
    offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct HistoryData {
    pub snapshots: Vec<SnapshotItem>,
    pub total: i64,
}

/// Snapshots from the trailing `days`-day window, newest first.
///
/// `days=0` is an empty window, not an error; `days` is capped at a year.
pub(super) async fn get_series(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(OwnerId(owner_id)): Extension<OwnerId>,
    Path(offer_id): Path<Uuid>,
    Query(query): Query<SeriesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_owned_offer(&state, &req_id.0, offer_id, owner_id).await?;

    let days = query.days.unwrap_or(DEFAULT_SERIES_DAYS).min(MAX_SERIES_DAYS);
    let cutoff = metrics::series_window_start(Utc::now(), days);

    let rows = snapshots::list_snapshots_since(&state.pool, offer_id, cutoff)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let items: Vec<SnapshotItem> = rows.into_iter().map(SnapshotItem::from).collect();

    Ok(Json(ApiResponse {
        data: items,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// One limit/offset page of an offer's full history, newest first, with the
/// page-independent total row count.
pub(super) async fn get_history_page(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(OwnerId(owner_id)): Extension<OwnerId>,
    Path(offer_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_owned_offer(&state, &req_id.0, offer_id, owner_id).await?;

    let limit = normalize_limit(query.limit);
    let offset = normalize_offset(query.offset);

    let rows = snapshots::list_snapshots_page(&state.pool, offer_id, limit, offset)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let total = snapshots::count_snapshots(&state.pool, offer_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let items: Vec<SnapshotItem> = rows.into_iter().map(SnapshotItem::from).collect();

    Ok(Json(ApiResponse {
        data: HistoryData {
            snapshots: items,
            total,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Resolves the offer under the caller's ownership or fails with 404.
async fn require_owned_offer(
    state: &AppState,
    req_id: &str,
    offer_id: Uuid,
    owner_id: Uuid,
) -> Result<(), ApiError> {
    offers::get_offer(&state.pool, offer_id, owner_id)
        .await
        .map_err(|e| map_db_error(req_id.to_owned(), &e))?
        .ok_or_else(|| ApiError::new(req_id.to_owned(), "not_found", "offer not found"))?;
    Ok(())
}
