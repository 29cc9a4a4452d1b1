use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// One row of the append-only attempt log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct DownloadAttempt {
    pub id: Uuid,
    pub file_id: Uuid,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub success: bool,
    pub downloaded_at: DateTime<Utc>,
}

/// Attempt to append. `id` and `downloaded_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDownloadAttempt {
    pub file_id: Uuid,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub success: bool,
}
