use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{CreateSharedFile, SharedFile};
use crate::share::{generate_share_token, is_valid_share_token, storage_filename};

pub struct FileService;

impl FileService {
    /// Gets a public file by its share token
    pub async fn get_public_by_share_token(
        pool: &PgPool,
        share_token: &str,
    ) -> AppResult<Option<SharedFile>> {
        if !is_valid_share_token(share_token) {
            return Ok(None);
        }

        let file = sqlx::query_as::<_, SharedFile>(
            r#"
            SELECT id, filename, original_filename, file_size, mime_type,
                   storage_path, share_token, is_public, download_count, created_at
            FROM files
            WHERE share_token = $1 AND is_public = TRUE
            "#,
        )
        .bind(share_token)
        .fetch_optional(pool)
        .await?;

        Ok(file)
    }

    /// Lists public files, newest first, with offset-based pagination
    pub async fn list_public(
        pool: &PgPool,
        page: i64,
        per_page: i64,
    ) -> AppResult<(Vec<SharedFile>, i64)> {
        let offset = (page - 1).saturating_mul(per_page);

        let total_count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM files WHERE is_public = TRUE")
                .fetch_one(pool)
                .await?;

        let files = sqlx::query_as::<_, SharedFile>(
            r#"
            SELECT id, filename, original_filename, file_size, mime_type,
                   storage_path, share_token, is_public, download_count, created_at
            FROM files
            WHERE is_public = TRUE
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok((files, total_count.0))
    }

    /// Registers a file that was already uploaded to object storage
    pub async fn create(pool: &PgPool, input: CreateSharedFile) -> AppResult<SharedFile> {
        let original_filename = input.original_filename.trim();
        if original_filename.is_empty() {
            return Err(AppError::Validation(
                "originalFilename cannot be empty".to_string(),
            ));
        }
        if original_filename.len() > 255 {
            return Err(AppError::Validation(
                "originalFilename cannot exceed 255 characters".to_string(),
            ));
        }
        if input.file_size < 0 {
            return Err(AppError::Validation(
                "fileSize cannot be negative".to_string(),
            ));
        }

        let storage_path = input.storage_path.trim();
        if storage_path.is_empty() {
            return Err(AppError::Validation(
                "storagePath cannot be empty".to_string(),
            ));
        }

        let mime_type = input
            .mime_type
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty());

        let filename = storage_filename(original_filename, Utc::now());
        let share_token = generate_share_token();

        let file = sqlx::query_as::<_, SharedFile>(
            r#"
            INSERT INTO files (filename, original_filename, file_size, mime_type,
                               storage_path, share_token)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, filename, original_filename, file_size, mime_type,
                      storage_path, share_token, is_public, download_count, created_at
            "#,
        )
        .bind(&filename)
        .bind(original_filename)
        .bind(input.file_size)
        .bind(mime_type)
        .bind(storage_path)
        .bind(&share_token)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.constraint() == Some("files_share_token_key") {
                    return AppError::Conflict("Share token collision, retry".to_string());
                }
            }
            AppError::Database(e)
        })?;

        Ok(file)
    }

    /// Bumps the download counter. Not tied to the quota.
    pub async fn increment_download_count(pool: &PgPool, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE files SET download_count = download_count + 1 WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }
}
