use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;

use super::{ApiError, ApiState, RequireAuth};
use crate::types::{Opus, OpusTypeConfig};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpusQuery {
    pub opus_type: Option<String>,
}

/// GET /api/opuses - List opuses, optionally of one type
pub async fn list_opuses(
    State(state): State<ApiState>,
    RequireAuth(_user): RequireAuth,
    Query(query): Query<OpusQuery>,
) -> Result<Json<Vec<Opus>>, ApiError> {
    let opus_type = query.opus_type.as_deref().filter(|t| !t.is_empty());
    state
        .repo
        .list_opuses(opus_type)
        .map(Json)
        .map_err(|e| ApiError::internal("Failed to load opuses", e))
}

/// GET /api/opus-types - List the type vocabulary
pub async fn list_opus_types(
    State(state): State<ApiState>,
    RequireAuth(_user): RequireAuth,
) -> Result<Json<Vec<OpusTypeConfig>>, ApiError> {
    state
        .repo
        .list_type_configs()
        .map(Json)
        .map_err(|e| ApiError::internal("Failed to fetch opus types", e))
}
