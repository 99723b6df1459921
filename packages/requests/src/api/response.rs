// ABOUTME: Shared API response types and error handling
// ABOUTME: Provides consistent response format across all API endpoints

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson},
};
use serde::Serialize;
use tracing::error;

use crate::storage::StorageError;

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Convert storage errors to HTTP responses. Details stay in the server
/// log; the client only sees a generic message.
impl IntoResponse for StorageError {
    fn into_response(self) -> axum::response::Response {
        error!("Storage failure: {}", self);
        let response = ApiResponse::<()>::error("Storage error".to_string());
        (StatusCode::INTERNAL_SERVER_ERROR, ResponseJson(response)).into_response()
    }
}
