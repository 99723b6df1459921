// ABOUTME: Integration tests for the requests API endpoints
// ABOUTME: Exercises the full lifecycle over the router with an in-memory store

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use worklane_requests::{
    create_requests_router, AppState, LogNotifier, RequestsManager, SubmissionThrottle,
    ThrottleConfig,
};

async fn test_app() -> Router {
    create_requests_router(AppState::in_memory().await.unwrap())
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn submission(user_id: &str, description: &str) -> Value {
    json!({
        "userId": user_id,
        "userEmail": format!("{}@x.com", user_id),
        "requestType": "dashboard",
        "description": description,
        "goals": ["automation"]
    })
}

#[tokio::test]
async fn test_full_request_lifecycle() {
    let app = test_app().await;

    // Create
    let (status, body) = send(
        &app,
        "POST",
        "/",
        Some(submission("u1", "Build a sales dashboard with weekly KPIs")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["request"]["status"], "queued");
    let id = body["requestId"].as_str().unwrap().to_string();
    assert!(!id.is_empty());

    // Move to in-progress
    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/{}", id),
        Some(json!({"action": "update-status", "status": "in-progress"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "in-progress");
    assert_eq!(
        body["data"]["description"],
        "Build a sales dashboard with weekly KPIs"
    );

    // Approve
    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/{}", id),
        Some(json!({"action": "approve", "liveUrl": "https://example.com/tool"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "completed");
    assert_eq!(body["data"]["liveUrl"], "https://example.com/tool");

    // Delete
    let (status, body) = send(&app, "DELETE", &format!("/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    // Gone
    let (status, _) = send(&app, "GET", &format!("/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_requires_user_id_or_admin() {
    let app = test_app().await;

    let (status, body) = send(&app, "GET", "/", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "User ID required");
}

#[tokio::test]
async fn test_empty_user_id_is_rejected_in_every_branch() {
    let app = test_app().await;

    for uri in [
        "/?userId=",
        "/?userId=&countOnly=true",
        "/?userId=&search=revenue",
    ] {
        let (status, body) = send(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "User ID required");
    }
}

#[tokio::test]
async fn test_counts_are_scoped_and_zero_filled() {
    let app = test_app().await;

    let (_, first) = send(
        &app,
        "POST",
        "/",
        Some(submission("u1", "First dashboard build request")),
    )
    .await;
    send(
        &app,
        "POST",
        "/",
        Some(submission("u1", "Second dashboard build request")),
    )
    .await;
    send(
        &app,
        "POST",
        "/",
        Some(submission("u2", "Unrelated assessment request")),
    )
    .await;

    // Complete one of u1's requests, then put a fresh one in its place
    let id = first["requestId"].as_str().unwrap();
    send(
        &app,
        "PATCH",
        &format!("/{}", id),
        Some(json!({"action": "approve", "liveUrl": "https://example.com/done"})),
    )
    .await;
    send(
        &app,
        "POST",
        "/",
        Some(submission("u1", "Third dashboard build request")),
    )
    .await;

    let (status, body) = send(&app, "GET", "/?userId=u1&countOnly=true", None).await;
    assert_eq!(status, StatusCode::OK);
    let counts = &body["data"];
    assert_eq!(counts["queued"], 2);
    assert_eq!(counts["completed"], 1);
    assert_eq!(counts["in-progress"], 0);
    assert_eq!(counts["ready-for-review"], 0);
    assert_eq!(counts["revisions-requested"], 0);

    // Unscoped admin counts include u2
    let (status, body) = send(&app, "GET", "/?countOnly=true&admin=true", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["queued"], 3);

    // countOnly without a scope is rejected
    let (status, _) = send(&app, "GET", "/?countOnly=true", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_scoping_and_case() {
    let app = test_app().await;

    send(
        &app,
        "POST",
        "/",
        Some(submission("u1", "Quarterly REVENUE report automation")),
    )
    .await;
    send(
        &app,
        "POST",
        "/",
        Some(submission("u2", "Revenue attribution dashboard")),
    )
    .await;

    let (status, body) = send(&app, "GET", "/?userId=u1&search=revenue", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, "GET", "/?search=revenue&admin=true", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_admin_listing_and_status_filter() {
    let app = test_app().await;

    let (_, first) = send(
        &app,
        "POST",
        "/",
        Some(submission("u1", "First dashboard build request")),
    )
    .await;
    send(
        &app,
        "POST",
        "/",
        Some(submission("u2", "Second dashboard build request")),
    )
    .await;

    let (status, body) = send(&app, "GET", "/?admin=true", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let id = first["requestId"].as_str().unwrap();
    send(
        &app,
        "PATCH",
        &format!("/{}", id),
        Some(json!({"action": "update-status", "status": "in-progress"})),
    )
    .await;

    let (status, body) = send(&app, "GET", "/?userId=u1&status=in-progress", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, "GET", "/?userId=u1&status=queued", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_invalid_status_is_rejected_without_mutation() {
    let app = test_app().await;

    let (_, created) = send(
        &app,
        "POST",
        "/",
        Some(submission("u1", "Dashboard with invalid transitions")),
    )
    .await;
    let id = created["requestId"].as_str().unwrap();

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/{}", id),
        Some(json!({"action": "update-status", "status": "bogus-status"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (_, body) = send(&app, "GET", &format!("/{}", id), None).await;
    assert_eq!(body["data"]["status"], "queued");
}

#[tokio::test]
async fn test_immutable_fields_rejected_on_patch() {
    let app = test_app().await;

    let (_, created) = send(
        &app,
        "POST",
        "/",
        Some(submission("u1", "Dashboard with protected fields")),
    )
    .await;
    let id = created["requestId"].as_str().unwrap();

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/{}", id),
        Some(json!({"userId": "intruder"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (_, body) = send(&app, "GET", &format!("/{}", id), None).await;
    assert_eq!(body["data"]["userId"], "u1");
}

#[tokio::test]
async fn test_validation_errors_carry_field_detail() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/",
        Some(json!({
            "userId": "u1",
            "userEmail": "u1@x.com",
            "requestType": "time-machine",
            "description": "short"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"requestType"));
    assert!(fields.contains(&"description"));
}

#[tokio::test]
async fn test_unknown_id_is_404_everywhere() {
    let app = test_app().await;

    let (status, _) = send(&app, "GET", "/missing-id", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "PATCH",
        "/missing-id",
        Some(json!({"action": "update-status", "status": "in-progress"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "PATCH",
        "/missing-id",
        Some(json!({"action": "approve", "liveUrl": "https://example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "PATCH",
        "/missing-id",
        Some(json!({"description": "A replacement description text"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", "/missing-id", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_statuses_endpoint_lists_the_closed_set() {
    let app = test_app().await;

    let (status, body) = send(&app, "GET", "/statuses", None).await;
    assert_eq!(status, StatusCode::OK);
    let statuses = body["data"].as_array().unwrap();
    assert_eq!(statuses.len(), 5);
    assert_eq!(statuses[0]["status"], "queued");
    assert_eq!(statuses[0]["label"], "Queued");
    assert!(statuses.iter().all(|s| s["color"].is_string()));
}

#[tokio::test]
async fn test_general_patch_merges_fields() {
    let app = test_app().await;

    let (_, created) = send(
        &app,
        "POST",
        "/",
        Some(submission("u1", "Dashboard with evolving scope")),
    )
    .await;
    let id = created["requestId"].as_str().unwrap();

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/{}", id),
        Some(json!({"previewUrl": "https://preview.example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["previewUrl"], "https://preview.example.com");
    assert_eq!(body["data"]["description"], "Dashboard with evolving scope");
    assert_eq!(body["data"]["status"], "queued");
}

#[tokio::test]
async fn test_submission_throttle_returns_429() {
    let requests = Arc::new(RequestsManager::in_memory().await.unwrap());
    let throttle = Arc::new(SubmissionThrottle::new(ThrottleConfig {
        enabled: true,
        submissions_per_minute: 1,
    }));
    let state = AppState::new(requests, throttle, Arc::new(LogNotifier));
    let app = create_requests_router(state);

    let (status, _) = send(
        &app,
        "POST",
        "/",
        Some(submission("u1", "First submission within the window")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "POST",
        "/",
        Some(submission("u1", "Second submission within the window")),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["success"], false);
}
