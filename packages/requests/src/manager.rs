use crate::storage::{factory::StorageManager, StatusCounts, StorageError};
use crate::types::{
    ClientRequest, RequestStatus, RequestSubmission, RequestUpdateInput, StatusUpdateInput,
};
use crate::validator::{
    immutable_field_attempt, validate_request_update, validate_submission, ValidationError,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Manager errors
#[derive(Error, Debug)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Validation failed")]
    Validation(Vec<ValidationError>),
    #[error("Invalid status: {0}")]
    InvalidStatus(String),
    #[error("Field '{0}' cannot be modified")]
    InvalidField(&'static str),
}

pub type ManagerResult<T> = Result<T, ManagerError>;

/// Coordinates validation and storage for client requests.
///
/// Missing ids come back as `None`; errors are reserved for validation
/// failures and storage faults.
pub struct RequestsManager {
    storage_manager: Arc<StorageManager>,
}

impl RequestsManager {
    pub fn new(storage_manager: Arc<StorageManager>) -> Self {
        Self { storage_manager }
    }

    /// Manager backed by the default on-disk SQLite store.
    pub async fn with_defaults() -> ManagerResult<Self> {
        let storage_manager = Arc::new(StorageManager::with_defaults().await?);
        Ok(Self::new(storage_manager))
    }

    /// Manager backed by the in-memory store.
    pub async fn in_memory() -> ManagerResult<Self> {
        let storage_manager = Arc::new(StorageManager::in_memory().await?);
        Ok(Self::new(storage_manager))
    }

    pub fn storage_manager(&self) -> Arc<StorageManager> {
        self.storage_manager.clone()
    }

    /// Validates a submission and persists it with status `queued`.
    pub async fn create_request(&self, data: RequestSubmission) -> ManagerResult<ClientRequest> {
        let input = validate_submission(&data).map_err(ManagerError::Validation)?;

        let storage = self.storage_manager.storage();
        let request = storage.create_request(input).await?;

        info!(
            "Created request {} ({}) for user {}",
            request.id, request.request_type, request.user_id
        );
        Ok(request)
    }

    pub async fn get_request(&self, id: &str) -> ManagerResult<Option<ClientRequest>> {
        let storage = self.storage_manager.storage();
        Ok(storage.get_request(id).await?)
    }

    /// Administrative listing across all users.
    pub async fn list_requests(&self) -> ManagerResult<Vec<ClientRequest>> {
        let storage = self.storage_manager.storage();
        let requests = storage.list_requests().await?;
        debug!("Retrieved {} requests", requests.len());
        Ok(requests)
    }

    /// One user's requests, optionally narrowed to a single status.
    pub async fn list_requests_for_user(
        &self,
        user_id: &str,
        status: Option<RequestStatus>,
    ) -> ManagerResult<Vec<ClientRequest>> {
        let storage = self.storage_manager.storage();
        let mut requests = storage.list_requests_for_user(user_id).await?;
        if let Some(status) = status {
            requests.retain(|r| r.status == status);
        }
        Ok(requests)
    }

    /// Applies a partial patch. Immutable fields are rejected before the
    /// storage layer ever sees them.
    pub async fn update_request(
        &self,
        id: &str,
        updates: RequestUpdateInput,
    ) -> ManagerResult<Option<ClientRequest>> {
        if let Some(field) = immutable_field_attempt(&updates) {
            return Err(ManagerError::InvalidField(field));
        }

        let validation_errors = validate_request_update(&updates);
        if !validation_errors.is_empty() {
            return Err(ManagerError::Validation(validation_errors));
        }

        let storage = self.storage_manager.storage();
        let request = storage.update_request(id, updates).await?;
        if request.is_some() {
            info!("Updated request {}", id);
        }
        Ok(request)
    }

    /// Moves a request to a new status from the closed set. The status
    /// arrives as a wire string and is rejected if it is not a member.
    pub async fn update_status(
        &self,
        id: &str,
        status: &str,
        extra: StatusUpdateInput,
    ) -> ManagerResult<Option<ClientRequest>> {
        let status = RequestStatus::parse(status)
            .ok_or_else(|| ManagerError::InvalidStatus(status.to_string()))?;

        let storage = self.storage_manager.storage();
        let request = storage.update_status(id, status, extra).await?;
        if request.is_some() {
            info!("Request {} moved to status {}", id, status);
        }
        Ok(request)
    }

    /// Approval marks the request completed and records the live URL and
    /// completion time in one step.
    pub async fn approve_request(
        &self,
        id: &str,
        live_url: &str,
    ) -> ManagerResult<Option<ClientRequest>> {
        let storage = self.storage_manager.storage();
        let request = storage.approve_request(id, live_url).await?;
        if request.is_some() {
            info!("Approved request {} ({})", id, live_url);
        }
        Ok(request)
    }

    pub async fn delete_request(&self, id: &str) -> ManagerResult<bool> {
        let storage = self.storage_manager.storage();
        let deleted = storage.delete_request(id).await?;
        if deleted {
            info!("Deleted request {}", id);
        }
        Ok(deleted)
    }

    pub async fn count_by_status(&self, user_id: Option<&str>) -> ManagerResult<StatusCounts> {
        let storage = self.storage_manager.storage();
        Ok(storage.count_by_status(user_id).await?)
    }

    pub async fn search_requests(
        &self,
        query: &str,
        user_id: Option<&str>,
    ) -> ManagerResult<Vec<ClientRequest>> {
        let storage = self.storage_manager.storage();
        let requests = storage.search_requests(query, user_id).await?;
        debug!("Found {} requests matching '{}'", requests.len(), query);
        Ok(requests)
    }
}
