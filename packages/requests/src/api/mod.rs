use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;

use crate::manager::{ManagerResult, RequestsManager};
use crate::notify::{LogNotifier, Notifier};
use crate::throttle::{SubmissionThrottle, ThrottleConfig};

pub mod handlers;
pub mod response;

/// Shared state for API handlers
#[derive(Clone)]
pub struct AppState {
    pub requests: Arc<RequestsManager>,
    pub throttle: Arc<SubmissionThrottle>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(
        requests: Arc<RequestsManager>,
        throttle: Arc<SubmissionThrottle>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            requests,
            throttle,
            notifier,
        }
    }

    /// State backed by the in-memory store with the throttle disabled,
    /// for tests and local experiments.
    pub async fn in_memory() -> ManagerResult<Self> {
        let requests = Arc::new(RequestsManager::in_memory().await?);
        let throttle = Arc::new(SubmissionThrottle::new(ThrottleConfig {
            enabled: false,
            ..ThrottleConfig::default()
        }));
        Ok(Self::new(requests, throttle, Arc::new(LogNotifier)))
    }
}

/// Creates the requests API router
pub fn create_requests_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(handlers::create_request))
        .route("/", get(handlers::list_requests))
        .route("/statuses", get(handlers::list_statuses))
        .route("/{id}", get(handlers::get_request))
        .route("/{id}", patch(handlers::patch_request))
        .route("/{id}", delete(handlers::delete_request))
        .with_state(state)
}
