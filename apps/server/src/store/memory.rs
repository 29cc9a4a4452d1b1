use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use uuid::Uuid;

use super::{AttemptFilter, AttemptStore, StoreError};
use crate::models::{DownloadAttempt, NewDownloadAttempt};

/// In-process attempt log for tests. Supports back-dated rows through `insert_at`.
#[derive(Debug, Default)]
pub struct MemoryAttemptStore {
    attempts: Mutex<Vec<DownloadAttempt>>,
}

impl MemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an attempt with an explicit timestamp (e.g. back-dated rows)
    pub fn insert_at(
        &self,
        attempt: NewDownloadAttempt,
        downloaded_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut attempts = self
            .attempts
            .lock()
            .map_err(|_| StoreError::Unavailable("attempt log lock poisoned".to_string()))?;

        attempts.push(DownloadAttempt {
            id: Uuid::new_v4(),
            file_id: attempt.file_id,
            ip_address: attempt.ip_address,
            user_agent: attempt.user_agent,
            success: attempt.success,
            downloaded_at,
        });

        Ok(())
    }

    /// Snapshot of every recorded attempt, in insertion order
    pub fn attempts(&self) -> Vec<DownloadAttempt> {
        self.attempts
            .lock()
            .map(|attempts| attempts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AttemptStore for MemoryAttemptStore {
    async fn insert(&self, attempt: NewDownloadAttempt) -> Result<(), StoreError> {
        self.insert_at(attempt, Utc::now())
    }

    async fn query(&self, filter: &AttemptFilter) -> Result<Vec<DownloadAttempt>, StoreError> {
        let attempts = self
            .attempts
            .lock()
            .map_err(|_| StoreError::Unavailable("attempt log lock poisoned".to_string()))?;

        let mut matching: Vec<DownloadAttempt> =
            attempts.iter().filter(|a| filter.matches(a)).cloned().collect();
        matching.sort_by_key(|a| a.downloaded_at);

        Ok(matching)
    }
}
