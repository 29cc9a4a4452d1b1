use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Shared file metadata. The bytes live in external object storage.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SharedFile {
    pub id: Uuid,
    pub filename: String,
    pub original_filename: String,
    pub file_size: i64,
    pub mime_type: Option<String>,
    #[serde(skip_serializing)]
    pub storage_path: String,
    pub share_token: String,
    pub is_public: bool,
    pub download_count: i64,
    pub created_at: DateTime<Utc>,
}

/// DTO for registering a file that was already uploaded to storage
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSharedFile {
    pub original_filename: String,
    pub file_size: i64,
    #[serde(default)]
    pub mime_type: Option<String>,
    pub storage_path: String,
}

/// Public view used by the share page
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedFileResponse {
    pub id: Uuid,
    pub original_filename: String,
    pub file_size: i64,
    pub mime_type: Option<String>,
    pub download_count: i64,
    pub share_token: String,
    pub created_at: DateTime<Utc>,
}

impl SharedFile {
    pub fn to_response(&self) -> SharedFileResponse {
        SharedFileResponse {
            id: self.id,
            original_filename: self.original_filename.clone(),
            file_size: self.file_size,
            mime_type: self.mime_type.clone(),
            download_count: self.download_count,
            share_token: self.share_token.clone(),
            created_at: self.created_at,
        }
    }
}
