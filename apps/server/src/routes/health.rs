use actix_web::{http::StatusCode, web, HttpResponse};
use serde::Serialize;

use crate::db::{self, DbPool};

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    checks: Option<ReadinessChecks>,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    database: &'static str,
}

/// GET /health - the process is up
pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        checks: None,
    })
}

/// GET /health/ready - 503 while the database (files and attempt log) is unreachable
pub async fn readiness(pool: web::Data<DbPool>) -> HttpResponse {
    let (status, database, http_status) = if db::health_check(pool.get_ref()).await {
        ("ready", "ok", StatusCode::OK)
    } else {
        ("not_ready", "error", StatusCode::SERVICE_UNAVAILABLE)
    };

    HttpResponse::build(http_status).json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        checks: Some(ReadinessChecks { database }),
    })
}

/// Configures health routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/health")
            .route("", web::get().to(liveness))
            .route("/ready", web::get().to(readiness)),
    );
}
