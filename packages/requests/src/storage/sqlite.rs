use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{migrate::MigrateDatabase, Row};
use tracing::{debug, info};

use super::{
    empty_status_counts, generate_request_id, RequestStorage, StatusCounts, StorageConfig,
    StorageError, StorageInfo, StorageProvider, StorageResult,
};
use crate::types::{
    ClientRequest, RequestCreateInput, RequestStatus, RequestType, RequestUpdateInput,
    StatusUpdateInput,
};

/// SQLite implementation of RequestStorage
pub struct SqliteStorage {
    pool: SqlitePool,
    config: StorageConfig,
}

impl SqliteStorage {
    /// Create a new SqliteStorage instance
    pub async fn new(config: StorageConfig) -> StorageResult<Self> {
        let database_path = match &config.provider {
            StorageProvider::Sqlite { path } => path,
            _ => return Err(StorageError::InvalidFormat),
        };

        // Ensure parent directory exists
        if let Some(parent) = database_path.parent() {
            std::fs::create_dir_all(parent).map_err(StorageError::Io)?;
        }

        let database_url = format!("sqlite:{}", database_path.display());

        // Create database if it doesn't exist
        if !sqlx::Sqlite::database_exists(&database_url)
            .await
            .map_err(StorageError::Sqlx)?
        {
            debug!("Creating database at: {}", database_url);
            sqlx::Sqlite::create_database(&database_url)
                .await
                .map_err(StorageError::Sqlx)?;
        }

        // Configure connection pool
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(std::time::Duration::from_secs(config.busy_timeout_seconds))
            .connect(&database_url)
            .await
            .map_err(StorageError::Sqlx)?;

        if config.enable_wal {
            sqlx::query("PRAGMA journal_mode = WAL")
                .execute(&pool)
                .await
                .map_err(StorageError::Sqlx)?;
        }

        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await
            .map_err(StorageError::Sqlx)?;

        sqlx::query("PRAGMA synchronous = NORMAL")
            .execute(&pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(Self { pool, config })
    }

    /// Convert a database row to a ClientRequest
    fn row_to_request(&self, row: &SqliteRow) -> StorageResult<ClientRequest> {
        let goals_json: Option<String> = row.try_get("goals")?;
        let goals = match goals_json {
            Some(json) => serde_json::from_str(&json)?,
            None => Vec::new(),
        };

        let status_str: String = row.try_get("status")?;
        let status = RequestStatus::parse(&status_str).ok_or_else(|| {
            StorageError::Database(format!("Invalid status in database: {}", status_str))
        })?;

        let request_type_str: String = row.try_get("request_type")?;
        let request_type = RequestType::parse(&request_type_str).unwrap_or(RequestType::Custom);

        let created_at = parse_timestamp(row, "created_at")?;
        let updated_at = parse_timestamp(row, "updated_at")?;
        let estimated_delivery = parse_optional_timestamp(row, "estimated_delivery")?;
        let completed_at = parse_optional_timestamp(row, "completed_at")?;

        Ok(ClientRequest {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            user_email: row.try_get("user_email")?,
            request_type,
            description: row.try_get("description")?,
            goals,
            current_lead_gen: row.try_get("current_lead_gen")?,
            status,
            created_at,
            updated_at,
            estimated_delivery,
            preview_url: row.try_get("preview_url")?,
            live_url: row.try_get("live_url")?,
            completed_at,
        })
    }
}

/// Escape LIKE metacharacters so a query matches them literally.
fn escape_like(query: &str) -> String {
    query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn parse_timestamp(row: &SqliteRow, column: &str) -> StorageResult<DateTime<Utc>> {
    let value: String = row.try_get(column)?;
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StorageError::Database(format!("Invalid {} timestamp", column)))
}

fn parse_optional_timestamp(row: &SqliteRow, column: &str) -> StorageResult<Option<DateTime<Utc>>> {
    let value: Option<String> = row.try_get(column)?;
    match value {
        Some(s) => {
            let parsed = DateTime::parse_from_rfc3339(&s)
                .map_err(|_| StorageError::Database(format!("Invalid {} timestamp", column)))?;
            Ok(Some(parsed.with_timezone(&Utc)))
        }
        None => Ok(None),
    }
}

#[async_trait]
impl RequestStorage for SqliteStorage {
    async fn initialize(&self) -> StorageResult<()> {
        info!("Initializing SQLite storage with migrations");

        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(StorageError::Migration)?;

        Ok(())
    }

    async fn create_request(&self, input: RequestCreateInput) -> StorageResult<ClientRequest> {
        let id = generate_request_id();
        let now = Utc::now();
        let goals_json = serde_json::to_string(&input.goals)?;

        // Status is forced to queued for every new request
        sqlx::query(
            r#"
            INSERT INTO requests (
                id, user_id, user_email, request_type, description, goals,
                current_lead_gen, status, created_at, updated_at,
                estimated_delivery
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&input.user_id)
        .bind(&input.user_email)
        .bind(input.request_type.as_str())
        .bind(&input.description)
        .bind(&goals_json)
        .bind(&input.current_lead_gen)
        .bind(RequestStatus::Queued.as_str())
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .bind(input.estimated_delivery.map(|dt| dt.to_rfc3339()))
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        debug!("Created request {} for user {}", id, input.user_id);
        self.get_request(&id).await?.ok_or_else(|| {
            StorageError::Database("Request missing immediately after insert".to_string())
        })
    }

    async fn get_request(&self, id: &str) -> StorageResult<Option<ClientRequest>> {
        let row = sqlx::query("SELECT * FROM requests WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        match row {
            Some(row) => Ok(Some(self.row_to_request(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_requests(&self) -> StorageResult<Vec<ClientRequest>> {
        let rows = sqlx::query("SELECT * FROM requests ORDER BY rowid ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        let mut requests = Vec::new();
        for row in rows {
            requests.push(self.row_to_request(&row)?);
        }

        debug!("Retrieved {} requests", requests.len());
        Ok(requests)
    }

    async fn list_requests_for_user(&self, user_id: &str) -> StorageResult<Vec<ClientRequest>> {
        let rows = sqlx::query("SELECT * FROM requests WHERE user_id = ? ORDER BY rowid ASC")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        let mut requests = Vec::new();
        for row in rows {
            requests.push(self.row_to_request(&row)?);
        }

        Ok(requests)
    }

    async fn update_request(
        &self,
        id: &str,
        input: RequestUpdateInput,
    ) -> StorageResult<Option<ClientRequest>> {
        // Immutable fields were rejected upstream; only patchable columns
        // are considered here.
        let mut query_parts = Vec::new();

        if input.description.is_some() {
            query_parts.push("description = ?");
        }
        if input.goals.is_some() {
            query_parts.push("goals = ?");
        }
        if input.current_lead_gen.is_some() {
            query_parts.push("current_lead_gen = ?");
        }
        if input.estimated_delivery.is_some() {
            query_parts.push("estimated_delivery = ?");
        }
        if input.preview_url.is_some() {
            query_parts.push("preview_url = ?");
        }
        if input.live_url.is_some() {
            query_parts.push("live_url = ?");
        }

        if query_parts.is_empty() {
            return self.get_request(id).await;
        }

        query_parts.push("updated_at = ?");

        let query_str = format!("UPDATE requests SET {} WHERE id = ?", query_parts.join(", "));
        let mut query = sqlx::query(&query_str);

        if let Some(ref description) = input.description {
            query = query.bind(description);
        }
        if let Some(ref goals) = input.goals {
            let goals_json = serde_json::to_string(goals)?;
            query = query.bind(goals_json);
        }
        if let Some(ref current_lead_gen) = input.current_lead_gen {
            query = query.bind(current_lead_gen);
        }
        if let Some(estimated_delivery) = input.estimated_delivery {
            query = query.bind(estimated_delivery.to_rfc3339());
        }
        if let Some(ref preview_url) = input.preview_url {
            query = query.bind(preview_url);
        }
        if let Some(ref live_url) = input.live_url {
            query = query.bind(live_url);
        }

        query = query.bind(Utc::now().to_rfc3339()).bind(id);

        let result = query.execute(&self.pool).await.map_err(StorageError::Sqlx)?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        debug!("Updated request {}", id);
        self.get_request(id).await
    }

    async fn update_status(
        &self,
        id: &str,
        status: RequestStatus,
        extra: StatusUpdateInput,
    ) -> StorageResult<Option<ClientRequest>> {
        let mut query_parts = vec!["status = ?"];

        if extra.estimated_delivery.is_some() {
            query_parts.push("estimated_delivery = ?");
        }
        if extra.preview_url.is_some() {
            query_parts.push("preview_url = ?");
        }
        query_parts.push("updated_at = ?");

        let query_str = format!("UPDATE requests SET {} WHERE id = ?", query_parts.join(", "));
        let mut query = sqlx::query(&query_str).bind(status.as_str());

        if let Some(estimated_delivery) = extra.estimated_delivery {
            query = query.bind(estimated_delivery.to_rfc3339());
        }
        if let Some(ref preview_url) = extra.preview_url {
            query = query.bind(preview_url);
        }
        query = query.bind(Utc::now().to_rfc3339()).bind(id);

        let result = query.execute(&self.pool).await.map_err(StorageError::Sqlx)?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        debug!("Request {} moved to status {}", id, status);
        self.get_request(id).await
    }

    async fn approve_request(
        &self,
        id: &str,
        live_url: &str,
    ) -> StorageResult<Option<ClientRequest>> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            UPDATE requests
            SET status = ?, live_url = ?, completed_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(RequestStatus::Completed.as_str())
        .bind(live_url)
        .bind(&now)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        debug!("Approved request {} with live URL {}", id, live_url);
        self.get_request(id).await
    }

    async fn delete_request(&self, id: &str) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM requests WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            debug!("Deleted request {}", id);
        }
        Ok(deleted)
    }

    async fn count_by_status(&self, user_id: Option<&str>) -> StorageResult<StatusCounts> {
        let rows = match user_id {
            Some(user_id) => {
                sqlx::query(
                    "SELECT status, COUNT(*) as count FROM requests WHERE user_id = ? GROUP BY status",
                )
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query("SELECT status, COUNT(*) as count FROM requests GROUP BY status")
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(StorageError::Sqlx)?;

        let mut counts = empty_status_counts();
        for row in rows {
            let status_str: String = row.try_get("status")?;
            let count: i64 = row.try_get("count")?;
            if let Some(status) = RequestStatus::parse(&status_str) {
                counts.insert(status, count as u64);
            }
        }

        Ok(counts)
    }

    async fn search_requests(
        &self,
        query: &str,
        user_id: Option<&str>,
    ) -> StorageResult<Vec<ClientRequest>> {
        // SQLite LIKE is case-insensitive for ASCII, which matches the
        // substring contract here. Wildcards in the query are escaped so
        // `%` and `_` match themselves, like the in-memory backend.
        let pattern = format!("%{}%", escape_like(query));

        let rows = match user_id {
            Some(user_id) => {
                sqlx::query(
                    r#"
                    SELECT * FROM requests
                    WHERE user_id = ?
                    AND (id LIKE ? ESCAPE '\'
                         OR description LIKE ? ESCAPE '\'
                         OR request_type LIKE ? ESCAPE '\')
                    ORDER BY rowid ASC
                    "#,
                )
                .bind(user_id)
                .bind(&pattern)
                .bind(&pattern)
                .bind(&pattern)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT * FROM requests
                    WHERE id LIKE ? ESCAPE '\'
                       OR description LIKE ? ESCAPE '\'
                       OR request_type LIKE ? ESCAPE '\'
                    ORDER BY rowid ASC
                    "#,
                )
                .bind(&pattern)
                .bind(&pattern)
                .bind(&pattern)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(StorageError::Sqlx)?;

        let mut requests = Vec::new();
        for row in rows {
            requests.push(self.row_to_request(&row)?);
        }

        debug!("Found {} requests matching query '{}'", requests.len(), query);
        Ok(requests)
    }

    async fn get_storage_info(&self) -> StorageResult<StorageInfo> {
        let count_row = sqlx::query("SELECT COUNT(*) as count FROM requests")
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;
        let total_requests: i64 = count_row.try_get("count")?;

        let last_modified_row = sqlx::query("SELECT MAX(updated_at) as last_modified FROM requests")
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;
        let last_modified_str: Option<String> = last_modified_row.try_get("last_modified")?;
        let last_modified = last_modified_str
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        let size_bytes = match &self.config.provider {
            StorageProvider::Sqlite { path } => {
                std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
            }
            _ => 0,
        };

        Ok(StorageInfo {
            provider: "SQLite".to_string(),
            total_requests: total_requests as usize,
            last_modified,
            size_bytes,
        })
    }
}
