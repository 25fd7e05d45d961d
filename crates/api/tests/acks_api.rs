//! HTTP-level integration tests for the `/acks` endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, get, post, post_json};
use serde_json::json;

// ---------------------------------------------------------------------------
// Test: recorded ack is found regardless of step casing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn recorded_ack_is_found_case_insensitively() {
    let app = build_test_app();
    let router = app.router;

    let response = post_json(
        router.clone(),
        "/api/v1/acks",
        json!({
            "correlationId": "c1",
            "step": "Resize",
            "artifacts": { "url": "https://cdn.example/x.png" }
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(body_json(response).await["accepted"], true);

    let response = get(router.clone(), "/api/v1/acks/c1/RESIZE").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["found"], true);
    assert_eq!(json["artifacts"]["url"], "https://cdn.example/x.png");
    assert!(json["recordedAt"].is_string());

    let steps = body_json(get(router, "/api/v1/acks/c1").await).await;
    assert_eq!(steps["data"], json!(["resize"]));
}

// ---------------------------------------------------------------------------
// Test: missing ack is "not yet", not an error
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_ack_is_not_found_without_error() {
    let app = build_test_app();
    let response = get(app.router, "/api/v1/acks/c1/resize").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json, json!({ "found": false }));
}

// ---------------------------------------------------------------------------
// Test: ack from a superseded generation is reported stale
// ---------------------------------------------------------------------------

#[tokio::test]
async fn superseded_generation_ack_is_stale() {
    let app = build_test_app();
    let router = app.router;

    // Entity e1 is on generation 2 after two retriggers.
    post(router.clone(), "/api/v1/entities/e1/retrigger").await;
    post(router.clone(), "/api/v1/entities/e1/retrigger").await;

    post_json(
        router.clone(),
        "/api/v1/acks",
        json!({ "correlationId": "c1", "step": "label", "generation": 1 }),
    )
    .await;

    let json = body_json(get(router.clone(), "/api/v1/acks/c1/label?entityId=e1").await).await;
    assert_eq!(json["found"], false);
    assert_eq!(json["stale"], true);

    // Without an entity to check against, the ack is taken as is.
    let json = body_json(get(router, "/api/v1/acks/c1/label").await).await;
    assert_eq!(json["found"], true);
}

// ---------------------------------------------------------------------------
// Test: store outage gives 500 on record and a structured 503 on poll
// ---------------------------------------------------------------------------

#[tokio::test]
async fn store_outage_is_surfaced() {
    let app = build_test_app();
    app.store.set_available(false);

    let response = post_json(
        app.router.clone(),
        "/api/v1/acks",
        json!({ "correlationId": "c1", "step": "resize" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["code"], "STORE_UNAVAILABLE");

    let response = get(app.router, "/api/v1/acks/c1/resize").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert_eq!(json["found"], false);
    assert!(json["error"].is_string());
}

// ---------------------------------------------------------------------------
// Test: invalid step is rejected with 400
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_step_is_rejected() {
    let app = build_test_app();
    let response = post_json(
        app.router,
        "/api/v1/acks",
        json!({ "correlationId": "c1", "step": "a:b" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_ARGUMENT");
}

// ---------------------------------------------------------------------------
// Test: malformed ack bodies are rejected as invalid arguments
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_correlation_id_is_invalid_argument() {
    let app = build_test_app();
    let response = post_json(
        app.router,
        "/api/v1/acks",
        json!({ "step": "resize", "artifacts": {} }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_ARGUMENT");
    assert!(json["error"].as_str().unwrap().contains("correlationId"));
}

#[tokio::test]
async fn correlation_id_with_colon_is_invalid_argument() {
    let app = build_test_app();
    let response = post_json(
        app.router,
        "/api/v1/acks",
        json!({ "correlationId": "c1:x", "step": "resize" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_ARGUMENT");
}
