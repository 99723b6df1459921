use std::sync::Arc;
use tracing::{debug, info};

use super::{
    memory::MemoryStorage, sqlite::SqliteStorage, RequestStorage, StorageConfig, StorageError,
    StorageProvider, StorageResult,
};
use crate::types::RequestStatus;

/// Factory for creating storage instances
pub struct StorageFactory;

impl StorageFactory {
    /// Create a new storage instance from configuration
    pub async fn create_storage(config: StorageConfig) -> StorageResult<Box<dyn RequestStorage>> {
        debug!("Creating storage with provider: {:?}", config.provider);

        match &config.provider {
            StorageProvider::Sqlite { path } => {
                info!("Initializing SQLite storage at: {:?}", path);
                let storage = SqliteStorage::new(config).await?;
                storage.initialize().await?;
                Ok(Box::new(storage))
            }
            StorageProvider::Memory => {
                info!("Initializing in-memory storage");
                let storage = MemoryStorage::new();
                storage.initialize().await?;
                Ok(Box::new(storage))
            }
        }
    }

    /// Create a storage instance with default configuration
    pub async fn create_default_storage() -> StorageResult<Box<dyn RequestStorage>> {
        Self::create_storage(StorageConfig::default()).await
    }

    /// Create a storage instance from a database URL
    pub async fn from_url(url: &str) -> StorageResult<Box<dyn RequestStorage>> {
        Self::create_storage(Self::config_from_url(url)?).await
    }

    /// Parse a database URL into a storage configuration
    pub fn config_from_url(url: &str) -> StorageResult<StorageConfig> {
        if let Some(path) = url.strip_prefix("sqlite:") {
            Ok(StorageConfig {
                provider: StorageProvider::Sqlite {
                    path: std::path::PathBuf::from(path),
                },
                ..StorageConfig::default()
            })
        } else if url == "memory:" {
            Ok(StorageConfig {
                provider: StorageProvider::Memory,
                ..StorageConfig::default()
            })
        } else {
            Err(StorageError::Database(format!(
                "Unsupported database URL: {}",
                url
            )))
        }
    }
}

/// Storage manager that holds and manages the active storage instance
pub struct StorageManager {
    storage: Arc<Box<dyn RequestStorage>>,
    config: StorageConfig,
}

impl StorageManager {
    /// Create a new storage manager with the given configuration
    pub async fn new(config: StorageConfig) -> StorageResult<Self> {
        let storage = Arc::new(StorageFactory::create_storage(config.clone()).await?);
        Ok(Self { storage, config })
    }

    /// Create a storage manager with default configuration
    pub async fn with_defaults() -> StorageResult<Self> {
        Self::new(StorageConfig::default()).await
    }

    /// Create a storage manager from a database URL
    pub async fn from_url(url: &str) -> StorageResult<Self> {
        Self::new(StorageFactory::config_from_url(url)?).await
    }

    /// Create a storage manager backed by the in-memory store
    pub async fn in_memory() -> StorageResult<Self> {
        let config = StorageConfig {
            provider: StorageProvider::Memory,
            ..StorageConfig::default()
        };
        Self::new(config).await
    }

    /// Get a reference to the storage instance
    pub fn storage(&self) -> Arc<Box<dyn RequestStorage>> {
        self.storage.clone()
    }

    /// Get the current configuration
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Test the storage connection
    pub async fn test_connection(&self) -> StorageResult<()> {
        debug!("Testing storage connection");
        let _info = self.storage.get_storage_info().await?;
        Ok(())
    }

    /// Get storage statistics
    pub async fn get_stats(&self) -> StorageResult<StorageStats> {
        let info = self.storage.get_storage_info().await?;
        let counts = self.storage.count_by_status(None).await?;

        let open_requests = RequestStatus::ALL
            .iter()
            .filter(|s| !s.is_terminal())
            .map(|s| counts.get(s).copied().unwrap_or(0))
            .sum::<u64>() as usize;
        let completed_requests = counts
            .get(&RequestStatus::Completed)
            .copied()
            .unwrap_or(0) as usize;

        Ok(StorageStats {
            total_requests: info.total_requests,
            open_requests,
            completed_requests,
            storage_size_bytes: info.size_bytes,
            last_modified: info.last_modified,
            provider: info.provider,
        })
    }
}

/// Statistics about the storage system
#[derive(Debug)]
pub struct StorageStats {
    pub total_requests: usize,
    pub open_requests: usize,
    pub completed_requests: usize,
    pub storage_size_bytes: u64,
    pub last_modified: chrono::DateTime<chrono::Utc>,
    pub provider: String,
}
