//! Admin banner management
//!
//! Writes go straight to storage. Cached lookups are not invalidated; they are
//! overwritten by the next read that reaches storage or expire with their TTL.

use super::params::{parse_int, parse_optional_int, query_value, QueryPairs};
use super::ApiError;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use banner_types::{
    BannerDraft, BannerFilter, BannerId, BannerSnapshot, FeatureId, IdResponse, TagId,
};
use tracing::info;

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<QueryPairs>,
) -> Result<Json<Vec<BannerSnapshot>>, ApiError> {
    let limit = parse_optional_int::<i64>(query_value(&query, "limit"))
        .ok()
        .filter(|l| l.map_or(true, |l| l >= 0))
        .ok_or_else(|| ApiError::bad_request("Invalid limit value"))?;
    let offset = parse_optional_int::<i64>(query_value(&query, "offset"))
        .ok()
        .filter(|o| o.map_or(true, |o| o >= 0))
        .ok_or_else(|| ApiError::bad_request("Invalid offset value"))?;

    // A malformed id is treated like an absent one
    let feature_id = parse_int::<FeatureId>(query_value(&query, "feature_id")).ok();
    let tag_id = parse_int::<TagId>(query_value(&query, "tag_id")).ok();
    if feature_id.is_none() && tag_id.is_none() {
        return Err(ApiError::bad_request(
            "At least one of feature_id or tag_id must be provided",
        ));
    }

    let filter = BannerFilter {
        feature_id,
        tag_id,
        limit,
        offset,
    };
    let banners = state.store.list(&filter).await?;

    Ok(Json(banners))
}

pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<BannerDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<IdResponse>), ApiError> {
    let Json(draft) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let banner_id = state.store.create(&draft).await?;
    info!(banner_id, feature_id = draft.feature_id, "Created banner");

    Ok((StatusCode::CREATED, Json(IdResponse { banner_id })))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<BannerDraft>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let id = banner_id(&id)?;
    let Json(draft) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;

    if !state.store.exists(id).await? {
        return Err(ApiError::not_found());
    }

    state.store.update(id, &draft).await?;
    info!(banner_id = id, "Updated banner");

    Ok(StatusCode::OK)
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = banner_id(&id)?;

    if !state.store.exists(id).await? {
        return Err(ApiError::not_found());
    }

    state.store.delete(id).await?;
    info!(banner_id = id, "Deleted banner");

    Ok(StatusCode::NO_CONTENT)
}

fn banner_id(raw: &str) -> Result<BannerId, ApiError> {
    parse_int(Some(raw)).map_err(|_| ApiError::bad_request("Invalid banner Id"))
}
