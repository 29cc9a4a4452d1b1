//! Time-limited access URLs for objects in external storage.

pub mod signed_url;

use async_trait::async_trait;

pub use signed_url::HmacUrlSigner;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid storage path: {0}")]
    InvalidPath(String),

    #[error("storage base URL cannot carry object paths: {0}")]
    InvalidBaseUrl(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Hands out URLs through which a client can fetch an object directly
#[async_trait]
pub trait AccessUrlIssuer: Send + Sync {
    async fn issue(&self, storage_path: &str) -> Result<String, StorageError>;
}
