use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::types::ClientRequest;

/// Contract for the transactional-email collaborator.
///
/// Dispatch is best-effort: implementations log failures and never let them
/// cross this boundary, so callers can fire and forget.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// A new request was submitted: confirmation to the submitter, alert to
    /// the admin inbox.
    async fn request_received(&self, request: &ClientRequest);
}

/// Default backend: records the dispatch in the log and sends nothing.
#[derive(Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn request_received(&self, request: &ClientRequest) {
        info!(
            "Notification (log only): request {} confirmation to {}, alert to admin",
            request.id, request.user_email
        );
    }
}

/// Configuration for the HTTP email backend
#[derive(Debug, Clone)]
pub struct HttpNotifierConfig {
    pub endpoint: String,
    pub api_key: String,
    pub from_address: String,
    pub admin_address: String,
}

/// One outbound message for the email endpoint
#[derive(Debug, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Backend that POSTs templated messages to a transactional-email HTTP API.
pub struct HttpNotifier {
    config: HttpNotifierConfig,
    client: reqwest::Client,
}

impl HttpNotifier {
    pub fn new(config: HttpNotifierConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn confirmation_message(&self, request: &ClientRequest) -> EmailMessage {
        EmailMessage {
            from: self.config.from_address.clone(),
            to: request.user_email.clone(),
            subject: format!("We received your {} request", request.request_type),
            text: format!(
                "Thanks for your request!\n\nReference: {}\nStatus: {}\n\n{}",
                request.id,
                request.status.label(),
                request.description
            ),
        }
    }

    fn admin_alert_message(&self, request: &ClientRequest) -> EmailMessage {
        EmailMessage {
            from: self.config.from_address.clone(),
            to: self.config.admin_address.clone(),
            subject: format!("New {} request from {}", request.request_type, request.user_email),
            text: format!(
                "Request {} submitted by {} ({})\n\n{}",
                request.id, request.user_id, request.user_email, request.description
            ),
        }
    }

    async fn dispatch(&self, message: EmailMessage) {
        let result = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&json!(message))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                info!("Dispatched notification to {}", message.to);
            }
            Ok(response) => {
                warn!(
                    "Notification endpoint returned {} for {}",
                    response.status(),
                    message.to
                );
            }
            Err(e) => {
                warn!("Failed to dispatch notification to {}: {}", message.to, e);
            }
        }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn request_received(&self, request: &ClientRequest) {
        self.dispatch(self.confirmation_message(request)).await;
        self.dispatch(self.admin_alert_message(request)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RequestStatus, RequestType};
    use chrono::Utc;

    fn request() -> ClientRequest {
        ClientRequest {
            id: "req-1".to_string(),
            user_id: "u1".to_string(),
            user_email: "u1@example.com".to_string(),
            request_type: RequestType::Dashboard,
            description: "Build a sales dashboard".to_string(),
            goals: Vec::new(),
            current_lead_gen: None,
            status: RequestStatus::Queued,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            estimated_delivery: None,
            preview_url: None,
            live_url: None,
            completed_at: None,
        }
    }

    fn notifier() -> HttpNotifier {
        HttpNotifier::new(HttpNotifierConfig {
            endpoint: "https://mail.example.com/send".to_string(),
            api_key: "key".to_string(),
            from_address: "hello@agency.example.com".to_string(),
            admin_address: "ops@agency.example.com".to_string(),
        })
    }

    #[test]
    fn test_confirmation_goes_to_submitter() {
        let message = notifier().confirmation_message(&request());
        assert_eq!(message.to, "u1@example.com");
        assert!(message.text.contains("req-1"));
        assert!(message.subject.contains("dashboard"));
    }

    #[test]
    fn test_admin_alert_goes_to_admin_inbox() {
        let message = notifier().admin_alert_message(&request());
        assert_eq!(message.to, "ops@agency.example.com");
        assert!(message.subject.contains("u1@example.com"));
    }

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        LogNotifier.request_received(&request()).await;
    }
}
