use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use super::{
    empty_status_counts, generate_request_id, RequestStorage, StatusCounts, StorageInfo,
    StorageResult,
};
use crate::types::{
    ClientRequest, RequestCreateInput, RequestStatus, RequestUpdateInput, StatusUpdateInput,
};

/// In-memory implementation of RequestStorage.
///
/// Records live in a single process and vanish on restart. Insertion order
/// is preserved, which gives per-user listings their creation order.
#[derive(Default)]
pub struct MemoryStorage {
    requests: RwLock<Vec<ClientRequest>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_query(request: &ClientRequest, needle: &str) -> bool {
    request.id.to_lowercase().contains(needle)
        || request.description.to_lowercase().contains(needle)
        || request.request_type.as_str().contains(needle)
}

#[async_trait]
impl RequestStorage for MemoryStorage {
    async fn initialize(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn create_request(&self, input: RequestCreateInput) -> StorageResult<ClientRequest> {
        let now = Utc::now();
        let request = ClientRequest {
            id: generate_request_id(),
            user_id: input.user_id,
            user_email: input.user_email,
            request_type: input.request_type,
            description: input.description,
            goals: input.goals,
            current_lead_gen: input.current_lead_gen,
            status: RequestStatus::Queued,
            created_at: now,
            updated_at: now,
            estimated_delivery: input.estimated_delivery,
            preview_url: None,
            live_url: None,
            completed_at: None,
        };

        let mut requests = self.requests.write().await;
        requests.push(request.clone());
        debug!("Created request {} in memory store", request.id);
        Ok(request)
    }

    async fn get_request(&self, id: &str) -> StorageResult<Option<ClientRequest>> {
        let requests = self.requests.read().await;
        Ok(requests.iter().find(|r| r.id == id).cloned())
    }

    async fn list_requests(&self) -> StorageResult<Vec<ClientRequest>> {
        let requests = self.requests.read().await;
        Ok(requests.clone())
    }

    async fn list_requests_for_user(&self, user_id: &str) -> StorageResult<Vec<ClientRequest>> {
        let requests = self.requests.read().await;
        Ok(requests
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_request(
        &self,
        id: &str,
        input: RequestUpdateInput,
    ) -> StorageResult<Option<ClientRequest>> {
        let mut requests = self.requests.write().await;
        let request = match requests.iter_mut().find(|r| r.id == id) {
            Some(r) => r,
            None => return Ok(None),
        };

        if let Some(description) = input.description {
            request.description = description;
        }
        if let Some(goals) = input.goals {
            request.goals = goals;
        }
        if let Some(current_lead_gen) = input.current_lead_gen {
            request.current_lead_gen = Some(current_lead_gen);
        }
        if let Some(estimated_delivery) = input.estimated_delivery {
            request.estimated_delivery = Some(estimated_delivery);
        }
        if let Some(preview_url) = input.preview_url {
            request.preview_url = Some(preview_url);
        }
        if let Some(live_url) = input.live_url {
            request.live_url = Some(live_url);
        }
        request.updated_at = Utc::now();

        Ok(Some(request.clone()))
    }

    async fn update_status(
        &self,
        id: &str,
        status: RequestStatus,
        extra: StatusUpdateInput,
    ) -> StorageResult<Option<ClientRequest>> {
        let mut requests = self.requests.write().await;
        let request = match requests.iter_mut().find(|r| r.id == id) {
            Some(r) => r,
            None => return Ok(None),
        };

        request.status = status;
        if let Some(estimated_delivery) = extra.estimated_delivery {
            request.estimated_delivery = Some(estimated_delivery);
        }
        if let Some(preview_url) = extra.preview_url {
            request.preview_url = Some(preview_url);
        }
        request.updated_at = Utc::now();

        Ok(Some(request.clone()))
    }

    async fn approve_request(
        &self,
        id: &str,
        live_url: &str,
    ) -> StorageResult<Option<ClientRequest>> {
        let mut requests = self.requests.write().await;
        let request = match requests.iter_mut().find(|r| r.id == id) {
            Some(r) => r,
            None => return Ok(None),
        };

        let now = Utc::now();
        request.status = RequestStatus::Completed;
        request.live_url = Some(live_url.to_string());
        request.completed_at = Some(now);
        request.updated_at = now;

        Ok(Some(request.clone()))
    }

    async fn delete_request(&self, id: &str) -> StorageResult<bool> {
        let mut requests = self.requests.write().await;
        let before = requests.len();
        requests.retain(|r| r.id != id);
        Ok(requests.len() < before)
    }

    async fn count_by_status(&self, user_id: Option<&str>) -> StorageResult<StatusCounts> {
        let requests = self.requests.read().await;
        let mut counts = empty_status_counts();
        for request in requests.iter() {
            if let Some(user_id) = user_id {
                if request.user_id != user_id {
                    continue;
                }
            }
            *counts.entry(request.status).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn search_requests(
        &self,
        query: &str,
        user_id: Option<&str>,
    ) -> StorageResult<Vec<ClientRequest>> {
        let needle = query.to_lowercase();
        let requests = self.requests.read().await;
        Ok(requests
            .iter()
            .filter(|r| user_id.map_or(true, |u| r.user_id == u))
            .filter(|r| matches_query(r, &needle))
            .cloned()
            .collect())
    }

    async fn get_storage_info(&self) -> StorageResult<StorageInfo> {
        let requests = self.requests.read().await;
        let last_modified = requests
            .iter()
            .map(|r| r.updated_at)
            .max()
            .unwrap_or_else(Utc::now);

        Ok(StorageInfo {
            provider: "Memory".to_string(),
            total_requests: requests.len(),
            last_modified,
            size_bytes: 0,
        })
    }
}
