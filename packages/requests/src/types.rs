use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle states for a client request.
///
/// The intended flow is linear with one loop-back edge:
/// `queued -> in-progress -> ready-for-review -> completed`, where
/// `ready-for-review` may fall back to `revisions-requested` and from there
/// return to `in-progress`. Transitions are not enforced; any member of the
/// set may be stored at any time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum RequestStatus {
    Queued,
    InProgress,
    ReadyForReview,
    RevisionsRequested,
    Completed,
}

impl RequestStatus {
    /// Every member of the closed status set, in intended-flow order.
    pub const ALL: [RequestStatus; 5] = [
        RequestStatus::Queued,
        RequestStatus::InProgress,
        RequestStatus::ReadyForReview,
        RequestStatus::RevisionsRequested,
        RequestStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Queued => "queued",
            RequestStatus::InProgress => "in-progress",
            RequestStatus::ReadyForReview => "ready-for-review",
            RequestStatus::RevisionsRequested => "revisions-requested",
            RequestStatus::Completed => "completed",
        }
    }

    /// Parse a wire-format status string. Returns `None` for anything
    /// outside the closed set.
    pub fn parse(s: &str) -> Option<RequestStatus> {
        match s {
            "queued" => Some(RequestStatus::Queued),
            "in-progress" => Some(RequestStatus::InProgress),
            "ready-for-review" => Some(RequestStatus::ReadyForReview),
            "revisions-requested" => Some(RequestStatus::RevisionsRequested),
            "completed" => Some(RequestStatus::Completed),
            _ => None,
        }
    }

    /// Human-readable label for UI display.
    pub fn label(&self) -> &'static str {
        match self {
            RequestStatus::Queued => "Queued",
            RequestStatus::InProgress => "In Progress",
            RequestStatus::ReadyForReview => "Ready for Review",
            RequestStatus::RevisionsRequested => "Revisions Requested",
            RequestStatus::Completed => "Completed",
        }
    }

    /// Display color for UI badges.
    pub fn color(&self) -> &'static str {
        match self {
            RequestStatus::Queued => "#64748b",
            RequestStatus::InProgress => "#3b82f6",
            RequestStatus::ReadyForReview => "#f59e0b",
            RequestStatus::RevisionsRequested => "#ef4444",
            RequestStatus::Completed => "#22c55e",
        }
    }

    /// Conventionally terminal; not enforced as immutable.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Completed)
    }
}

impl Default for RequestStatus {
    fn default() -> Self {
        RequestStatus::Queued
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Display metadata for one status, served to UI consumers.
#[derive(Debug, Clone, Serialize)]
pub struct StatusMeta {
    pub status: RequestStatus,
    pub label: &'static str,
    pub color: &'static str,
}

impl StatusMeta {
    pub fn all() -> Vec<StatusMeta> {
        RequestStatus::ALL
            .iter()
            .map(|s| StatusMeta {
                status: *s,
                label: s.label(),
                color: s.color(),
            })
            .collect()
    }
}

/// Categories of client work
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RequestType {
    Dashboard,
    Assessment,
    ProposalGenerator,
    Custom,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::Dashboard => "dashboard",
            RequestType::Assessment => "assessment",
            RequestType::ProposalGenerator => "proposal-generator",
            RequestType::Custom => "custom",
        }
    }

    pub fn parse(s: &str) -> Option<RequestType> {
        match s {
            "dashboard" => Some(RequestType::Dashboard),
            "assessment" => Some(RequestType::Assessment),
            "proposal-generator" => Some(RequestType::ProposalGenerator),
            "custom" => Some(RequestType::Custom),
            _ => None,
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A tracked client request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRequest {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "userEmail")]
    pub user_email: String,
    #[serde(rename = "requestType")]
    pub request_type: RequestType,
    pub description: String,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(rename = "currentLeadGen")]
    pub current_lead_gen: Option<String>,
    #[serde(default)]
    pub status: RequestStatus,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "estimatedDelivery")]
    pub estimated_delivery: Option<DateTime<Utc>>,
    #[serde(rename = "previewUrl")]
    pub preview_url: Option<String>,
    #[serde(rename = "liveUrl")]
    pub live_url: Option<String>,
    #[serde(rename = "completedAt")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Input for creating a new request. Status is not accepted here; every new
/// request starts `queued`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestCreateInput {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "userEmail")]
    pub user_email: String,
    #[serde(rename = "requestType")]
    pub request_type: RequestType,
    pub description: String,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(rename = "currentLeadGen")]
    pub current_lead_gen: Option<String>,
    #[serde(rename = "estimatedDelivery")]
    pub estimated_delivery: Option<DateTime<Utc>>,
}

/// A raw form submission as received at the API boundary, before
/// validation. All fields are optional so shape problems surface as
/// field-level errors instead of deserialization failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestSubmission {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    #[serde(rename = "userEmail")]
    pub user_email: Option<String>,
    #[serde(rename = "requestType")]
    pub request_type: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(rename = "currentLeadGen")]
    pub current_lead_gen: Option<String>,
    #[serde(rename = "estimatedDelivery")]
    pub estimated_delivery: Option<DateTime<Utc>>,
}

/// Partial patch for a general update. Fields left `None` are untouched.
///
/// `id`, `user_id`, `user_email`, and `created_at` are present so that a
/// client attempting to overwrite them gets a field-level rejection instead
/// of a silent drop; the manager never forwards them to storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestUpdateInput {
    pub id: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    #[serde(rename = "userEmail")]
    pub user_email: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub goals: Option<Vec<String>>,
    #[serde(rename = "currentLeadGen")]
    pub current_lead_gen: Option<String>,
    #[serde(rename = "estimatedDelivery")]
    pub estimated_delivery: Option<DateTime<Utc>>,
    #[serde(rename = "previewUrl")]
    pub preview_url: Option<String>,
    #[serde(rename = "liveUrl")]
    pub live_url: Option<String>,
}

/// Auxiliary fields carried alongside a status change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusUpdateInput {
    #[serde(rename = "estimatedDelivery")]
    pub estimated_delivery: Option<DateTime<Utc>>,
    #[serde(rename = "previewUrl")]
    pub preview_url: Option<String>,
}
