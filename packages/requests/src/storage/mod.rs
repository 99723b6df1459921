use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

use crate::types::{ClientRequest, RequestCreateInput, RequestStatus, RequestUpdateInput, StatusUpdateInput};

pub mod factory;
pub mod memory;
pub mod sqlite;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid storage configuration")]
    InvalidFormat,
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Per-status record counts, zero-filled across the whole status set.
pub type StatusCounts = BTreeMap<RequestStatus, u64>;

/// Returns a counts map with every status present at zero.
pub fn empty_status_counts() -> StatusCounts {
    RequestStatus::ALL.iter().map(|s| (*s, 0)).collect()
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub provider: StorageProvider,
    pub enable_wal: bool,
    pub max_connections: u32,
    pub busy_timeout_seconds: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: StorageProvider::Sqlite {
                path: worklane_dir().join("worklane.db"),
            },
            enable_wal: true,
            max_connections: 10,
            busy_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StorageProvider {
    Sqlite { path: PathBuf },
    Memory,
}

/// Default data directory (`~/.worklane`).
pub fn worklane_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".worklane")
}

/// Main storage trait that all backing implementations must implement.
///
/// Missing ids are reported as `None`/`false`, never as errors; errors are
/// reserved for actual storage faults.
#[async_trait]
pub trait RequestStorage: Send + Sync {
    // Initialization
    async fn initialize(&self) -> StorageResult<()>;

    // Core CRUD operations
    async fn create_request(&self, input: RequestCreateInput) -> StorageResult<ClientRequest>;
    async fn get_request(&self, id: &str) -> StorageResult<Option<ClientRequest>>;
    async fn list_requests(&self) -> StorageResult<Vec<ClientRequest>>;
    async fn list_requests_for_user(&self, user_id: &str) -> StorageResult<Vec<ClientRequest>>;
    async fn update_request(
        &self,
        id: &str,
        input: RequestUpdateInput,
    ) -> StorageResult<Option<ClientRequest>>;
    async fn update_status(
        &self,
        id: &str,
        status: RequestStatus,
        extra: StatusUpdateInput,
    ) -> StorageResult<Option<ClientRequest>>;
    async fn approve_request(
        &self,
        id: &str,
        live_url: &str,
    ) -> StorageResult<Option<ClientRequest>>;
    async fn delete_request(&self, id: &str) -> StorageResult<bool>;

    // Aggregate queries
    async fn count_by_status(&self, user_id: Option<&str>) -> StorageResult<StatusCounts>;
    async fn search_requests(
        &self,
        query: &str,
        user_id: Option<&str>,
    ) -> StorageResult<Vec<ClientRequest>>;

    // Storage information
    async fn get_storage_info(&self) -> StorageResult<StorageInfo>;
}

/// Information about the storage system
#[derive(Debug)]
pub struct StorageInfo {
    pub provider: String,
    pub total_requests: usize,
    pub last_modified: DateTime<Utc>,
    pub size_bytes: u64,
}

/// Generate a unique request ID
pub fn generate_request_id() -> String {
    use uuid::Uuid;
    Uuid::new_v4().to_string()
}
