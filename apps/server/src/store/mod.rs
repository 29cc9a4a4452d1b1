//! Persisted attempt log.
//!
//! The download gate and the attempt recorder only see the log through the
//! [`AttemptStore`] trait, so the handle is passed in explicitly and tests can
//! swap PostgreSQL for [`MemoryAttemptStore`].

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{DownloadAttempt, NewDownloadAttempt};

pub use memory::MemoryAttemptStore;
pub use postgres::PgAttemptStore;

/// Errors raised by an attempt store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Selects successful attempts of one (file, ip) pair recorded strictly after `after`.
/// An attempt made at T stops counting at exactly T + window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptFilter {
    pub file_id: Uuid,
    pub ip_address: String,
    pub after: DateTime<Utc>,
}

impl AttemptFilter {
    pub fn matches(&self, attempt: &DownloadAttempt) -> bool {
        attempt.success
            && attempt.file_id == self.file_id
            && attempt.ip_address == self.ip_address
            && attempt.downloaded_at > self.after
    }
}

#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Appends one attempt. The store assigns `id` and `downloaded_at`.
    async fn insert(&self, attempt: NewDownloadAttempt) -> Result<(), StoreError>;

    /// Returns the successful attempts matching `filter`, oldest first.
    async fn query(&self, filter: &AttemptFilter) -> Result<Vec<DownloadAttempt>, StoreError>;
}
