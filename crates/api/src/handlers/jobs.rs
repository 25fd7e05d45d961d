//! Handler for analysis job submission.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use handoff_core::error::CoreError;
use handoff_core::types::Generation;
use handoff_dispatch::JobEnqueuer;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitJob {
    pub entity_id: String,
    pub kind: Option<String>,
    pub strategy: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitJobResponse {
    pub accepted: bool,
    pub entity_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<Generation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /api/v1/jobs
///
/// Open a new generation for the entity and hand the job to the execution
/// queue. 202 once the queue accepts; 502 with `accepted: false` when it
/// refuses, in which case the entity is now `failed`.
pub async fn submit_job(
    State(state): State<AppState>,
    AppJson(input): AppJson<SubmitJob>,
) -> AppResult<Response> {
    let kind = input
        .kind
        .as_deref()
        .unwrap_or(&state.config.default_job_kind);
    let strategy = input
        .strategy
        .as_deref()
        .unwrap_or(&state.config.default_job_strategy);

    match JobEnqueuer::submit(
        state.store.as_ref(),
        state.job_queue.as_ref(),
        &input.entity_id,
        kind,
        strategy,
    )
    .await
    {
        Ok(request) => Ok((
            StatusCode::ACCEPTED,
            Json(SubmitJobResponse {
                accepted: true,
                entity_id: request.entity_id,
                generation: Some(request.generation),
                error: None,
            }),
        )
            .into_response()),
        Err(CoreError::UpstreamSubmissionFailed(msg)) => Ok((
            StatusCode::BAD_GATEWAY,
            Json(SubmitJobResponse {
                accepted: false,
                entity_id: input.entity_id,
                generation: None,
                error: Some(msg),
            }),
        )
            .into_response()),
        Err(err) => Err(AppError::Core(err)),
    }
}
