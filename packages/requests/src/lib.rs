//! # Worklane Requests
//!
//! Client request lifecycle tracking for Worklane: CRUD operations over
//! status-tagged work items with persistent storage, validation, and
//! notification dispatch.

pub mod api;
pub mod manager;
pub mod notify;
pub mod storage;
pub mod throttle;
pub mod types;
pub mod validator;

// Re-export main types
pub use types::{
    ClientRequest, RequestCreateInput, RequestStatus, RequestSubmission, RequestType,
    RequestUpdateInput, StatusMeta, StatusUpdateInput,
};

// Re-export manager types
pub use manager::{ManagerError, ManagerResult, RequestsManager};

// Re-export storage types and traits
pub use storage::{
    factory::{StorageFactory, StorageManager, StorageStats},
    generate_request_id, worklane_dir, RequestStorage, StatusCounts, StorageConfig, StorageError,
    StorageInfo, StorageProvider, StorageResult,
};

// Re-export validation
pub use validator::{validate_request_update, validate_submission, ValidationError};

// Re-export API surface
pub use api::{create_requests_router, AppState};

// Re-export collaborator contracts
pub use notify::{HttpNotifier, HttpNotifierConfig, LogNotifier, Notifier};
pub use throttle::{SubmissionThrottle, ThrottleConfig};
