use async_trait::async_trait;
use sqlx::PgPool;

use super::{AttemptFilter, AttemptStore, StoreError};
use crate::models::{DownloadAttempt, NewDownloadAttempt};

/// Attempt log backed by the `download_attempts` table
#[derive(Debug, Clone)]
pub struct PgAttemptStore {
    pool: PgPool,
}

impl PgAttemptStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttemptStore for PgAttemptStore {
    async fn insert(&self, attempt: NewDownloadAttempt) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO download_attempts (file_id, ip_address, user_agent, success)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(attempt.file_id)
        .bind(&attempt.ip_address)
        .bind(&attempt.user_agent)
        .bind(attempt.success)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn query(&self, filter: &AttemptFilter) -> Result<Vec<DownloadAttempt>, StoreError> {
        let attempts = sqlx::query_as::<_, DownloadAttempt>(
            r#"
            SELECT id, file_id, ip_address, user_agent, success, downloaded_at
            FROM download_attempts
            WHERE file_id = $1
              AND ip_address = $2
              AND success = TRUE
              AND downloaded_at > $3
            ORDER BY downloaded_at ASC
            "#,
        )
        .bind(filter.file_id)
        .bind(&filter.ip_address)
        .bind(filter.after)
        .fetch_all(&self.pool)
        .await?;

        Ok(attempts)
    }
}
