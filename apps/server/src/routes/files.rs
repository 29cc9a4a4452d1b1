use actix_web::{web, HttpResponse};

use crate::config::Config;
use crate::db::DbPool;
use crate::error::{AppResult, ErrorResponse};
use crate::models::CreateSharedFile;
use crate::pagination::{ListFilesQuery, OffsetPaginatedResponse};
use crate::services::FileService;

/// GET /api/files - Public files, newest first
pub async fn list_files(
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    query: web::Query<ListFilesQuery>,
) -> AppResult<HttpResponse> {
    let (page, per_page) = query.bounds();

    let (files, total_count) = match FileService::list_public(pool.get_ref(), page, per_page).await
    {
        Ok(result) => result,
        Err(e) => return Ok(e.localized_response(config.locale)),
    };

    let responses: Vec<_> = files.iter().map(|f| f.to_response()).collect();

    Ok(HttpResponse::Ok().json(OffsetPaginatedResponse::new(
        responses,
        total_count,
        page,
        per_page,
    )))
}

/// POST /api/files - Register an uploaded file and mint its share token
pub async fn register_file(
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    body: web::Json<CreateSharedFile>,
) -> AppResult<HttpResponse> {
    let file = match FileService::create(pool.get_ref(), body.into_inner()).await {
        Ok(file) => file,
        Err(e) => return Ok(e.localized_response(config.locale)),
    };

    log::info!(
        "Registered file {} ({} bytes) as {}",
        file.id,
        file.file_size,
        file.filename
    );

    Ok(HttpResponse::Created().json(file.to_response()))
}

/// GET /api/share/{token} - Public metadata for the share page
pub async fn get_shared_file(
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let token = path.into_inner();

    match FileService::get_public_by_share_token(pool.get_ref(), &token).await {
        Ok(Some(file)) => Ok(HttpResponse::Ok().json(file.to_response())),
        Ok(None) => Ok(HttpResponse::NotFound().json(ErrorResponse {
            error: config.locale.file_not_found().to_string(),
        })),
        Err(e) => Ok(e.localized_response(config.locale)),
    }
}

/// Configures file routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/files", web::get().to(list_files))
        .route("/api/files", web::post().to(register_file))
        .route("/api/share/{token}", web::get().to(get_shared_file));
}
