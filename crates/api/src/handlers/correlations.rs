use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use handoff_core::correlation::generate_correlation_id;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationResponse {
    pub correlation_id: String,
}

/// POST /api/v1/correlations
///
/// Mint a correlation id for a new request chain. Nothing is stored.
pub async fn create_correlation() -> impl IntoResponse {
    let correlation_id = generate_correlation_id();
    tracing::debug!(correlation_id = %correlation_id, "Correlation id issued");
    (StatusCode::CREATED, Json(CorrelationResponse { correlation_id }))
}
