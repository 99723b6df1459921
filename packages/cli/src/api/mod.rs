use axum::{routing::get, Router};
use std::sync::Arc;
use tracing::info;

use worklane_requests::{
    create_requests_router, AppState, HttpNotifier, LogNotifier, Notifier, RequestsManager,
    StorageManager, SubmissionThrottle,
};

use crate::config::Config;

pub mod health;

pub async fn create_router(config: &Config) -> anyhow::Result<Router> {
    let storage_manager = match &config.database_url {
        Some(url) => Arc::new(StorageManager::from_url(url).await?),
        None => Arc::new(StorageManager::with_defaults().await?),
    };

    let requests = Arc::new(RequestsManager::new(storage_manager));
    let throttle = Arc::new(SubmissionThrottle::new(config.throttle.clone()));

    let notifier: Arc<dyn Notifier> = match &config.notifier {
        Some(notifier_config) => {
            info!(endpoint = %notifier_config.endpoint, "outbound notifications enabled");
            Arc::new(HttpNotifier::new(notifier_config.clone()))
        }
        None => Arc::new(LogNotifier),
    };

    let state = AppState::new(requests, throttle, notifier);

    Ok(Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/status", get(health::status_check))
        .nest("/api/requests", create_requests_router(state)))
}
