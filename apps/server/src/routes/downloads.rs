use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;

use crate::client_ip::ClientInfo;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::{AppResult, ErrorResponse};
use crate::locale::Locale;
use crate::services::download_limit::{AttemptRecorder, DownloadGate, LimitCheck};
use crate::services::FileService;
use crate::storage::AccessUrlIssuer;
use crate::store::AttemptStore;

/// User agent recorded when the client sends none
const UNKNOWN_USER_AGENT: &str = "Unknown";

/// Response for a granted download
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    pub download_url: String,
    pub filename: String,
    pub remaining_attempts: i64,
    pub message: String,
}

/// Response when the quota is exhausted
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitExceededResponse {
    pub error: String,
    pub remaining_attempts: i64,
}

/// GET /api/check-limits/{token} - Report the quota without recording anything
pub async fn check_limits(
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    store: web::Data<dyn AttemptStore>,
    client: ClientInfo,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let token = path.into_inner();
    let file = match FileService::get_public_by_share_token(pool.get_ref(), &token).await {
        Ok(Some(file)) => file,
        Ok(None) => return Ok(file_not_found(config.locale)),
        Err(e) => return Ok(e.localized_response(config.locale)),
    };

    let gate = DownloadGate::new(
        store.get_ref(),
        config.download_limit.policy(),
        config.locale,
    );
    let limit = gate.check_download_limit(file.id, &client.ip).await;

    Ok(HttpResponse::Ok().json(limit))
}

/// GET /api/download/{token} - Gate, sign and record a download
pub async fn download(
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    store: web::Data<dyn AttemptStore>,
    issuer: web::Data<dyn AccessUrlIssuer>,
    client: ClientInfo,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let locale = config.locale;

    // 1. Resolve the share token. Unknown tokens are not recorded.
    let token = path.into_inner();
    let file = match FileService::get_public_by_share_token(pool.get_ref(), &token).await {
        Ok(Some(file)) => file,
        Ok(None) => return Ok(file_not_found(locale)),
        Err(e) => return Ok(e.localized_response(locale)),
    };

    let gate = DownloadGate::new(store.get_ref(), config.download_limit.policy(), locale);
    let recorder = AttemptRecorder::new(store.get_ref());
    let user_agent = client.user_agent.as_deref().unwrap_or(UNKNOWN_USER_AGENT);

    // 2. Check the quota
    let limit = gate.check_download_limit(file.id, &client.ip).await;
    if !limit.can_download {
        log::warn!(
            "Download limit reached for file {} from {}",
            file.id,
            client.ip
        );
        recorder
            .record_download_attempt(file.id, &client.ip, Some(user_agent), false)
            .await;
        return Ok(limit_exceeded(&limit));
    }

    // 3. Issue the access URL
    let download_url = match issuer.issue(&file.storage_path).await {
        Ok(url) => url,
        Err(e) => {
            log::error!("Failed to issue download URL for file {}: {}", file.id, e);
            recorder
                .record_download_attempt(file.id, &client.ip, Some(user_agent), false)
                .await;
            return Ok(HttpResponse::InternalServerError().json(ErrorResponse {
                error: locale.link_failed().to_string(),
            }));
        }
    };

    // 4. Record the success and bump the counter
    recorder
        .record_download_attempt(file.id, &client.ip, Some(user_agent), true)
        .await;

    if let Err(e) = FileService::increment_download_count(pool.get_ref(), file.id).await {
        log::warn!("Failed to update download count for file {}: {}", file.id, e);
    }

    let remaining = (limit.remaining_attempts - 1).max(0);
    log::info!(
        "Download granted for file {} to {} ({} left)",
        file.id,
        client.ip,
        remaining
    );

    Ok(HttpResponse::Ok().json(DownloadResponse {
        download_url,
        filename: file.original_filename,
        remaining_attempts: remaining,
        message: locale.download_started(remaining),
    }))
}

fn file_not_found(locale: Locale) -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse {
        error: locale.file_not_found().to_string(),
    })
}

fn limit_exceeded(limit: &LimitCheck) -> HttpResponse {
    let mut response = HttpResponse::TooManyRequests();
    if let Some(retry_after) = limit.retry_after_secs(Utc::now()) {
        response.insert_header(("Retry-After", retry_after.to_string()));
    }

    response.json(LimitExceededResponse {
        error: limit.message.clone().unwrap_or_default(),
        remaining_attempts: 0,
    })
}

/// Configures the download routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/download/{token}", web::get().to(download))
        .route("/api/check-limits/{token}", web::get().to(check_limits));
}
