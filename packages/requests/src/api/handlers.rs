use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::response::ApiResponse;
use super::AppState;
use crate::manager::ManagerError;
use crate::types::{
    ClientRequest, RequestStatus, RequestSubmission, RequestUpdateInput, StatusMeta,
    StatusUpdateInput,
};
use crate::validator::ValidationError;

/// Response for a successful creation
#[derive(Serialize)]
pub struct CreateRequestResponse {
    pub success: bool,
    #[serde(rename = "requestId")]
    pub request_id: String,
    pub request: ClientRequest,
}

/// Validation failure with field-level detail
#[derive(Serialize)]
struct ValidationErrorResponse {
    success: bool,
    error: String,
    errors: Vec<ValidationError>,
}

/// Convert manager errors to HTTP responses
impl IntoResponse for ManagerError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ManagerError::Validation(errors) => {
                let response = ValidationErrorResponse {
                    success: false,
                    error: "Validation failed".to_string(),
                    errors,
                };
                (StatusCode::BAD_REQUEST, ResponseJson(response)).into_response()
            }
            ManagerError::InvalidStatus(_) | ManagerError::InvalidField(_) => {
                let response = ApiResponse::<()>::error(self.to_string());
                (StatusCode::BAD_REQUEST, ResponseJson(response)).into_response()
            }
            ManagerError::Storage(e) => e.into_response(),
        }
    }
}

fn not_found() -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        ResponseJson(ApiResponse::<()>::error("Request not found".to_string())),
    )
        .into_response()
}

fn bad_request(message: &str) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        ResponseJson(ApiResponse::<()>::error(message.to_string())),
    )
        .into_response()
}

/// Create a new request
pub async fn create_request(
    State(state): State<AppState>,
    Json(submission): Json<RequestSubmission>,
) -> impl IntoResponse {
    let user_email = match (
        submission.user_id.as_deref().map(str::trim),
        submission.user_email.as_deref().map(str::trim),
    ) {
        (Some(user_id), Some(user_email)) if !user_id.is_empty() && !user_email.is_empty() => {
            user_email.to_string()
        }
        _ => return bad_request("User information required"),
    };

    if !state.throttle.check(&user_email) {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            ResponseJson(ApiResponse::<()>::error(
                "Too many submissions, please try again shortly".to_string(),
            )),
        )
            .into_response();
    }

    match state.requests.create_request(submission).await {
        Ok(request) => {
            info!("Created request {} for {}", request.id, user_email);

            // Email dispatch is fire-and-forget; a failed send never fails
            // the creation.
            let notifier = state.notifier.clone();
            let snapshot = request.clone();
            tokio::spawn(async move {
                notifier.request_received(&snapshot).await;
            });

            (
                StatusCode::OK,
                ResponseJson(CreateRequestResponse {
                    success: true,
                    request_id: request.id.clone(),
                    request,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to create request: {}", e);
            e.into_response()
        }
    }
}

/// Query parameters for GET /requests
#[derive(Deserialize)]
pub struct ListRequestsQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    #[serde(rename = "countOnly")]
    pub count_only: Option<String>,
    pub admin: Option<String>,
}

fn flag(value: &Option<String>) -> bool {
    value.as_deref() == Some("true")
}

/// List, search, or count requests.
///
/// Priority order: countOnly, then search, then admin listing, then a
/// user's own records. Counts and search are admin-wide only when
/// `admin=true`; otherwise a userId is required for scope.
pub async fn list_requests(
    State(state): State<AppState>,
    Query(params): Query<ListRequestsQuery>,
) -> impl IntoResponse {
    let admin = flag(&params.admin);

    if flag(&params.count_only) {
        let scope = match (admin, params.user_id.as_deref()) {
            (true, _) => None,
            (false, Some(user_id)) if !user_id.is_empty() => Some(user_id),
            (false, _) => return bad_request("User ID required"),
        };

        return match state.requests.count_by_status(scope).await {
            Ok(counts) => {
                (StatusCode::OK, ResponseJson(ApiResponse::success(counts))).into_response()
            }
            Err(e) => e.into_response(),
        };
    }

    if let Some(ref query) = params.search {
        let scope = match (admin, params.user_id.as_deref()) {
            (true, _) => None,
            (false, Some(user_id)) if !user_id.is_empty() => Some(user_id),
            (false, _) => return bad_request("User ID required"),
        };

        return match state.requests.search_requests(query, scope).await {
            Ok(requests) => {
                (StatusCode::OK, ResponseJson(ApiResponse::success(requests))).into_response()
            }
            Err(e) => e.into_response(),
        };
    }

    if admin {
        return match state.requests.list_requests().await {
            Ok(requests) => {
                info!("Admin listing returned {} requests", requests.len());
                (StatusCode::OK, ResponseJson(ApiResponse::success(requests))).into_response()
            }
            Err(e) => e.into_response(),
        };
    }

    let user_id = match params.user_id.as_deref() {
        Some(user_id) if !user_id.is_empty() => user_id,
        _ => return bad_request("User ID required"),
    };

    let status = match params.status.as_deref() {
        Some(raw) => match RequestStatus::parse(raw) {
            Some(status) => Some(status),
            None => return ManagerError::InvalidStatus(raw.to_string()).into_response(),
        },
        None => None,
    };

    match state.requests.list_requests_for_user(user_id, status).await {
        Ok(requests) => {
            (StatusCode::OK, ResponseJson(ApiResponse::success(requests))).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Status display metadata for UI consumers
pub async fn list_statuses() -> impl IntoResponse {
    (
        StatusCode::OK,
        ResponseJson(ApiResponse::success(StatusMeta::all())),
    )
}

/// Get a specific request by ID
pub async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.requests.get_request(&id).await {
        Ok(Some(request)) => {
            (StatusCode::OK, ResponseJson(ApiResponse::success(request))).into_response()
        }
        Ok(None) => not_found(),
        Err(e) => {
            error!("Failed to get request {}: {}", id, e);
            e.into_response()
        }
    }
}

/// PATCH body, discriminated by the `action` field. A body without an
/// action is a plain partial update.
#[derive(Deserialize)]
#[serde(tag = "action")]
pub enum RequestPatchBody {
    #[serde(rename = "update-status")]
    UpdateStatus {
        status: String,
        #[serde(rename = "estimatedDelivery")]
        estimated_delivery: Option<DateTime<Utc>>,
        #[serde(rename = "previewUrl")]
        preview_url: Option<String>,
    },
    #[serde(rename = "approve")]
    Approve {
        #[serde(rename = "liveUrl")]
        live_url: String,
    },
    #[serde(untagged)]
    Update(RequestUpdateInput),
}

/// Update a request: general patch, status change, or approval
pub async fn patch_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<RequestPatchBody>,
) -> impl IntoResponse {
    let result = match body {
        RequestPatchBody::UpdateStatus {
            status,
            estimated_delivery,
            preview_url,
        } => {
            info!("Updating status of request {} to {}", id, status);
            let extra = StatusUpdateInput {
                estimated_delivery,
                preview_url,
            };
            state.requests.update_status(&id, &status, extra).await
        }
        RequestPatchBody::Approve { live_url } => {
            info!("Approving request {}", id);
            state.requests.approve_request(&id, &live_url).await
        }
        RequestPatchBody::Update(updates) => {
            info!("Updating request {}", id);
            state.requests.update_request(&id, updates).await
        }
    };

    match result {
        Ok(Some(request)) => {
            (StatusCode::OK, ResponseJson(ApiResponse::success(request))).into_response()
        }
        Ok(None) => not_found(),
        Err(e) => {
            error!("Failed to patch request {}: {}", id, e);
            e.into_response()
        }
    }
}

/// Delete a request
pub async fn delete_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.requests.delete_request(&id).await {
        Ok(true) => {
            info!("Deleted request {}", id);
            (
                StatusCode::OK,
                ResponseJson(ApiResponse::success("Request deleted")),
            )
                .into_response()
        }
        Ok(false) => not_found(),
        Err(e) => {
            error!("Failed to delete request {}: {}", id, e);
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_create_and_fetch_request() {
        let state = AppState::in_memory().await.unwrap();
        let app = crate::api::create_requests_router(state);

        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({
                    "userId": "u1",
                    "userEmail": "u1@example.com",
                    "requestType": "dashboard",
                    "description": "Build a sales dashboard with weekly KPIs",
                    "goals": ["automation"]
                })
                .to_string(),
            ))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let request = Request::builder()
            .method("GET")
            .uri("/?userId=u1")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_user_info_is_rejected() {
        let state = AppState::in_memory().await.unwrap();
        let app = crate::api::create_requests_router(state);

        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({
                    "requestType": "dashboard",
                    "description": "Build a sales dashboard with weekly KPIs"
                })
                .to_string(),
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_patch_body_discriminator() {
        let body: RequestPatchBody = serde_json::from_value(json!({
            "action": "update-status",
            "status": "in-progress"
        }))
        .unwrap();
        assert!(matches!(body, RequestPatchBody::UpdateStatus { .. }));

        let body: RequestPatchBody = serde_json::from_value(json!({
            "action": "approve",
            "liveUrl": "https://example.com/tool"
        }))
        .unwrap();
        assert!(matches!(body, RequestPatchBody::Approve { .. }));

        let body: RequestPatchBody = serde_json::from_value(json!({
            "description": "A longer replacement description"
        }))
        .unwrap();
        assert!(matches!(body, RequestPatchBody::Update(_)));
    }
}
