//! Handlers for the read-only lookup endpoints.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use verbatim_core::types::IndexHit;

use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 5;
const MAX_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct LookupParams {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LookupResponse {
    pub count: usize,
    pub results: Vec<IndexHit>,
}

/// `GET /lookup?q=...&limit=...` - prefix lookup over the quote index.
///
/// The query is turned into a prefix search (`q` + `*`); results come back
/// in descending score order, shaped exactly like index hits.
pub async fn lookup(
    State(state): State<AppState>,
    Query(params): Query<LookupParams>,
) -> Result<Json<LookupResponse>, ApiError> {
    let q = params.q.unwrap_or_default();
    let q = q.trim();
    if q.is_empty() {
        return Err(ApiError::BadRequest("query parameter 'q' is required".to_string()));
    }
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let results = state.index.query(&state.index_name, &format!("{q}*"), limit)?;
    debug!(q, count = results.len(), "Lookup served");
    Ok(Json(LookupResponse {
        count: results.len(),
        results,
    }))
}

/// `GET /health` - liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
