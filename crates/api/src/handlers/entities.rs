//! Handlers for entity processing status.
//!
//! An entity with children has a derived status: children report through
//! `set_child_status` and the parent follows via reconciliation. Childless
//! entities are written directly.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use handoff_core::processing_status::ProcessingStatus;
use handoff_core::types::Generation;
use handoff_store::repositories::StatusRepo;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SetStatus {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct SetChildStatus {
    pub status: String,
    /// Generation the worker was handed; older than current means dropped.
    pub generation: Option<Generation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterChildren {
    pub child_ids: Vec<String>,
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

/// GET /api/v1/entities/{id}/status
///
/// The entity record with its children and per-state counts.
pub async fn get_status(
    State(state): State<AppState>,
    Path(entity_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let view = StatusRepo::get_with_children(state.store.as_ref(), &entity_id).await?;
    Ok(Json(DataResponse { data: view }))
}

// ---------------------------------------------------------------------------
// Write
// ---------------------------------------------------------------------------

/// PUT /api/v1/entities/{id}/status
///
/// Direct write for childless entities. 409 for entities with children
/// and for transitions out of a terminal state.
pub async fn set_status(
    State(state): State<AppState>,
    Path(entity_id): Path<String>,
    AppJson(input): AppJson<SetStatus>,
) -> AppResult<impl IntoResponse> {
    let status: ProcessingStatus = input.status.parse()?;
    let record = StatusRepo::set_entity_status(state.store.as_ref(), &entity_id, status).await?;
    Ok(Json(DataResponse { data: record }))
}

/// PUT /api/v1/entities/{id}/children
///
/// Declare the full child set up front so the parent cannot complete
/// before every child has been seen.
pub async fn register_children(
    State(state): State<AppState>,
    Path(entity_id): Path<String>,
    AppJson(input): AppJson<RegisterChildren>,
) -> AppResult<impl IntoResponse> {
    if input.child_ids.is_empty() {
        return Err(AppError::BadRequest("childIds must not be empty".into()));
    }
    let view =
        StatusRepo::register_children(state.store.as_ref(), &entity_id, &input.child_ids).await?;
    Ok(Json(DataResponse { data: view }))
}

/// PUT /api/v1/entities/{id}/children/{child_id}/status
///
/// Record a child's status and reconcile the parent in the same call.
pub async fn set_child_status(
    State(state): State<AppState>,
    Path((entity_id, child_id)): Path<(String, String)>,
    AppJson(input): AppJson<SetChildStatus>,
) -> AppResult<impl IntoResponse> {
    let status: ProcessingStatus = input.status.parse()?;
    let update = StatusRepo::set_child_status(
        state.store.as_ref(),
        &entity_id,
        &child_id,
        status,
        input.generation,
    )
    .await?;
    Ok(Json(update))
}

/// POST /api/v1/entities/{id}/reconcile
pub async fn reconcile(
    State(state): State<AppState>,
    Path(entity_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let outcome = StatusRepo::reconcile(state.store.as_ref(), &entity_id).await?;
    Ok(Json(outcome))
}

/// POST /api/v1/entities/{id}/retrigger
///
/// Start a new generation in `triggering`. This is also how a `failed` or
/// `completed` entity is re-run.
pub async fn retrigger(
    State(state): State<AppState>,
    Path(entity_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let record = StatusRepo::retrigger(state.store.as_ref(), &entity_id).await?;
    Ok(Json(DataResponse { data: record }))
}
