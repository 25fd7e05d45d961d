//! Handlers for the `/acks` resource.
//!
//! Workers record one ack per processing step; initiators poll for it. An
//! absent ack is never an error, only "not yet".

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use handoff_core::ack::{AckPoll, Acknowledgment, Artifacts};
use handoff_core::error::CoreError;
use handoff_core::types::{Generation, Timestamp};
use handoff_store::repositories::AckRepo;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordAck {
    pub correlation_id: String,
    pub step: String,
    #[serde(default)]
    pub artifacts: Artifacts,
    pub generation: Option<Generation>,
}

#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub accepted: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollQuery {
    /// When set, the ack's generation is checked against this entity's.
    pub entity_id: Option<String>,
}

/// Body of a poll. `found` is only true for an ack the caller may act on;
/// an ack from a superseded generation comes back with `stale: true`.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResponse {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<Artifacts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PollResponse {
    fn found(ack: Acknowledgment) -> Self {
        Self {
            found: true,
            artifacts: Some(ack.artifacts),
            recorded_at: Some(ack.recorded_at),
            ..Self::default()
        }
    }

    fn stale(ack: Acknowledgment) -> Self {
        Self {
            found: false,
            recorded_at: Some(ack.recorded_at),
            stale: Some(true),
            ..Self::default()
        }
    }
}

/// POST /api/v1/acks
///
/// Record that a step finished for a correlation id. Returns 202; a store
/// failure is surfaced as 500 so the worker knows to retry.
pub async fn record_ack(
    State(state): State<AppState>,
    AppJson(input): AppJson<RecordAck>,
) -> AppResult<impl IntoResponse> {
    AckRepo::record(
        state.store.as_ref(),
        &input.correlation_id,
        &input.step,
        input.artifacts,
        input.generation,
        state.config.ack_ttl(),
    )
    .await?;
    Ok((StatusCode::ACCEPTED, Json(AcceptedResponse { accepted: true })))
}

/// GET /api/v1/acks/{correlation_id}/{step}?entityId=
///
/// Step matching is case-insensitive. If the store cannot be reached the
/// poll still answers with a structured body (`found: false` plus the
/// error) and 503, so the caller can keep polling.
pub async fn poll_ack(
    State(state): State<AppState>,
    Path((correlation_id, step)): Path<(String, String)>,
    Query(params): Query<PollQuery>,
) -> AppResult<Response> {
    let store = state.store.as_ref();
    let result = match params.entity_id.as_deref() {
        Some(entity_id) => {
            AckRepo::poll_for_entity(store, &correlation_id, &step, entity_id).await
        }
        None => AckRepo::poll(store, &correlation_id, &step)
            .await
            .map(|ack| ack.map_or(AckPoll::Pending, AckPoll::Found)),
    };

    let body = match result {
        Ok(AckPoll::Pending) => PollResponse::default(),
        Ok(AckPoll::Found(ack)) => PollResponse::found(ack),
        Ok(AckPoll::Stale(ack)) => PollResponse::stale(ack),
        Err(CoreError::StoreUnavailable(msg)) => {
            tracing::warn!(correlation_id = %correlation_id, step = %step, error = %msg, "Ack poll failed");
            let body = PollResponse {
                error: Some(msg),
                ..PollResponse::default()
            };
            return Ok((StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response());
        }
        Err(err) => return Err(AppError::Core(err)),
    };

    Ok(Json(body).into_response())
}

/// GET /api/v1/acks/{correlation_id}
///
/// Steps acknowledged so far for a correlation id, sorted.
pub async fn list_steps(
    State(state): State<AppState>,
    Path(correlation_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let steps = AckRepo::list_steps(state.store.as_ref(), &correlation_id).await?;
    Ok(Json(DataResponse { data: steps }))
}
