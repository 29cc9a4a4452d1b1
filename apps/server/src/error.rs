use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;

use crate::locale::Locale;
use crate::storage::StorageError;
use crate::store::StoreError;

/// JSON error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Application errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Attempt store error: {0}")]
    Store(#[from] StoreError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Message shown to the client. Infrastructure failures are reduced to a
    /// generic message; the detail only goes to the log.
    pub fn public_message(&self, locale: Locale) -> String {
        match self {
            AppError::NotFound(msg) | AppError::Validation(msg) | AppError::Conflict(msg) => {
                msg.clone()
            }
            AppError::Database(_)
            | AppError::Store(_)
            | AppError::Storage(_)
            | AppError::Internal(_) => locale.internal_error().to_string(),
        }
    }

    /// Error body in `locale`. `ResponseError` never sees app data, so handlers
    /// holding the configured locale render their errors through this.
    pub fn localized_response(&self, locale: Locale) -> HttpResponse {
        if self.status_code().is_server_error() {
            log::error!("Request failed: {}", self);
        }

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.public_message(locale),
        })
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        self.localized_response(Locale::default())
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
