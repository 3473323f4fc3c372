//! User-facing banner lookup

use super::params::{parse_int, query_value, QueryPairs};
use super::ApiError;
use crate::AppState;
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use banner_types::{BannerContent, FeatureId, Role, TagId};

pub async fn get(
    State(state): State<AppState>,
    Extension(role): Extension<Role>,
    Query(query): Query<QueryPairs>,
) -> Result<Json<BannerContent>, ApiError> {
    let feature_id = parse_int::<i64>(query_value(&query, "feature_id"));
    let tag_id = parse_int::<i64>(query_value(&query, "tag_id"));
    let (Ok(feature_id), Ok(tag_id)) = (feature_id, tag_id) else {
        return Err(ApiError::bad_request("tag_id and feature_id are required"));
    };
    // Valid integers that no stored id can hold match nothing
    let (Ok(feature_id), Ok(tag_id)) =
        (FeatureId::try_from(feature_id), TagId::try_from(tag_id))
    else {
        return Err(ApiError::not_found());
    };
    let use_last_revision = query_value(&query, "use_last_revision") == Some("true");

    let content = state
        .resolver
        .resolve(feature_id, tag_id, use_last_revision, role.is_privileged())
        .await?;

    content.map(Json).ok_or_else(ApiError::not_found)
}
