//! Handlers for the `/drafts` resource: the deduplicated pending queue.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use handoff_core::draft::DraftFlags;
use handoff_core::error::CoreError;
use handoff_core::types::Timestamp;
use handoff_store::repositories::DraftRepo;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::response::DataResponse;
use crate::state::AppState;

/// Slugs returned by `GET /drafts/pending` when no limit is given.
const DEFAULT_PEEK_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueDraft {
    pub slug: String,
    pub payload: serde_json::Value,
    #[serde(default)]
    pub flags: DraftFlags,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueDraftResponse {
    pub accepted: bool,
    pub slug: String,
    pub queue_length: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueLengthResponse {
    pub queue_length: u64,
}

#[derive(Debug, Deserialize)]
pub struct PeekQuery {
    pub limit: Option<usize>,
}

/// Version guard for `DELETE /drafts/{slug}`: the `updatedAt` of the
/// record the caller consumed.
#[derive(Debug, Deserialize)]
pub struct ClearQuery {
    pub version: Option<Timestamp>,
}

// ---------------------------------------------------------------------------
// Enqueue
// ---------------------------------------------------------------------------

/// POST /api/v1/drafts
///
/// Store the draft and move its slug to the queue tail. Re-submitting a
/// slug replaces the payload and keeps one queue entry. Returns 202.
pub async fn enqueue_draft(
    State(state): State<AppState>,
    AppJson(input): AppJson<EnqueueDraft>,
) -> AppResult<impl IntoResponse> {
    let queue_length = DraftRepo::enqueue(
        state.store.as_ref(),
        &input.slug,
        input.payload,
        input.flags,
        state.config.draft_ttl(),
    )
    .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(EnqueueDraftResponse {
            accepted: true,
            slug: input.slug.trim().to_string(),
            queue_length,
        }),
    ))
}

// ---------------------------------------------------------------------------
// Queue introspection
// ---------------------------------------------------------------------------

/// GET /api/v1/drafts/pending?limit=n
pub async fn peek_pending(
    State(state): State<AppState>,
    Query(params): Query<PeekQuery>,
) -> AppResult<impl IntoResponse> {
    let limit = params.limit.unwrap_or(DEFAULT_PEEK_LIMIT);
    let slugs = DraftRepo::peek_pending(state.store.as_ref(), limit).await?;
    Ok(Json(DataResponse { data: slugs }))
}

/// GET /api/v1/drafts/queue
pub async fn queue_length(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let queue_length = DraftRepo::queue_length(state.store.as_ref()).await?;
    Ok(Json(QueueLengthResponse { queue_length }))
}

// ---------------------------------------------------------------------------
// Consume
// ---------------------------------------------------------------------------

/// POST /api/v1/drafts/claim
///
/// Pop the next slug whose draft is still live. `data` is `null` when the
/// queue is drained. The record stays in place until the consumer clears it.
pub async fn claim_draft(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let record = DraftRepo::claim_next(state.store.as_ref()).await?;
    Ok(Json(DataResponse { data: record }))
}

/// GET /api/v1/drafts/{slug}
pub async fn get_draft(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let record = DraftRepo::find(state.store.as_ref(), &slug)
        .await?
        .ok_or_else(|| CoreError::not_found("Draft", slug))?;
    Ok(Json(DataResponse { data: record }))
}

/// DELETE /api/v1/drafts/{slug}?version=
///
/// Idempotent: 204 whether or not a record was removed. With `version`, a
/// newer submission of the same slug is left in place.
pub async fn clear_draft(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<ClearQuery>,
) -> AppResult<StatusCode> {
    DraftRepo::clear(state.store.as_ref(), &slug, params.version).await?;
    Ok(StatusCode::NO_CONTENT)
}
