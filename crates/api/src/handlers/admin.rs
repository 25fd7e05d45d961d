use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use handoff_core::error::CoreError;
use serde::Deserialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct KeysQuery {
    pub pattern: Option<String>,
}

/// GET /api/v1/admin/keys?pattern=
///
/// Sorted key names matching a glob (default `*`). Scans the whole
/// keyspace; diagnostic use only.
pub async fn list_keys(
    State(state): State<AppState>,
    Query(params): Query<KeysQuery>,
) -> AppResult<impl IntoResponse> {
    let pattern = params.pattern.as_deref().unwrap_or("*");
    let mut keys = state
        .store
        .keys_matching(pattern)
        .await
        .map_err(CoreError::from)?;
    keys.sort();
    tracing::debug!(pattern, count = keys.len(), "Keys listed");
    Ok(Json(DataResponse { data: keys }))
}
