//! Integration tests for the Downloads API
//!
//! Tests the download and check-limits endpoints with a real PostgreSQL database.

use actix_web::{test, web, App};
use fileshare::config::ClientIpConfig;
use fileshare::routes;
use fileshare::storage::AccessUrlIssuer;
use fileshare::store::{AttemptStore, PgAttemptStore};
use serde_json::Value;
use std::sync::Arc;

use crate::common::{
    create_test_config, create_test_file, test_signer, FailingIssuer, TestDb, UnavailableStore,
};

/// Builds the download routes around the given collaborators
macro_rules! download_app {
    ($db:expr, $config:expr, $store:expr, $issuer:expr) => {{
        let store: Arc<dyn AttemptStore> = $store;
        let issuer: Arc<dyn AccessUrlIssuer> = $issuer;
        test::init_service(
            App::new()
                .app_data(web::Data::new($db.pool.clone()))
                .app_data(web::Data::new($config))
                .app_data(web::Data::from(store))
                .app_data(web::Data::from(issuer))
                .configure(routes::downloads::configure),
        )
        .await
    }};
}

fn pg_store(db: &TestDb) -> Arc<dyn AttemptStore> {
    Arc::new(PgAttemptStore::new(db.pool.clone()))
}

fn download_request(token: &str, ip: &str) -> test::TestRequest {
    test::TestRequest::get()
        .uri(&format!("/api/download/{}", token))
        .insert_header(("cf-connecting-ip", ip))
        .insert_header(("User-Agent", "integration-test"))
}

// =============================================================================
// Download Tests
// =============================================================================

#[actix_web::test]
async fn test_download_returns_signed_url() {
    let db = TestDb::new().await;
    let file = create_test_file(&db.pool, "Quarterly Report.pdf").await;
    let app = download_app!(db, create_test_config(), pg_store(&db), Arc::new(test_signer()));

    let req = download_request(&file.share_token, "203.0.113.5").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    let url = body["downloadUrl"].as_str().unwrap();
    assert!(url.starts_with("https://cdn.example.test/files/uploads/"));
    assert!(url.contains("signature="));
    assert_eq!(body["filename"], "Quarterly Report.pdf");
    assert_eq!(body["remainingAttempts"], 2);
    assert!(body["message"].as_str().unwrap().contains('2'));

    assert_eq!(
        db.attempts_for(file.id).await,
        vec![(true, "203.0.113.5".to_string())]
    );
    assert_eq!(db.download_count(file.id).await, 1);
}

#[actix_web::test]
async fn test_fourth_download_is_rejected() {
    let db = TestDb::new().await;
    let file = create_test_file(&db.pool, "data.csv").await;
    let app = download_app!(db, create_test_config(), pg_store(&db), Arc::new(test_signer()));

    for expected in [2, 1, 0] {
        let req = download_request(&file.share_token, "203.0.113.5").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["remainingAttempts"], expected);
    }

    let req = download_request(&file.share_token, "203.0.113.5").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 429);

    let retry_after: u64 = resp
        .headers()
        .get("Retry-After")
        .expect("Retry-After header missing")
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_after > 0 && retry_after <= 24 * 3600);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["remainingAttempts"], 0);
    assert!(body["error"].as_str().unwrap().contains("limit of 3"));

    // Rejection is logged as a failed attempt and does not bump the counter
    let attempts = db.attempts_for(file.id).await;
    assert_eq!(attempts.len(), 4);
    assert!(!attempts[3].0);
    assert_eq!(db.download_count(file.id).await, 3);

    // A different address still has its full quota
    let req = download_request(&file.share_token, "198.51.100.7").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn test_unknown_token_returns_404_without_recording() {
    let db = TestDb::new().await;
    let app = download_app!(db, create_test_config(), pg_store(&db), Arc::new(test_signer()));

    let req = download_request("doesnotexist", "203.0.113.5").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "File not found or not available");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM download_attempts")
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[actix_web::test]
async fn test_private_file_returns_404() {
    let db = TestDb::new().await;
    let file = create_test_file(&db.pool, "private.txt").await;
    db.set_public(file.id, false).await;
    let app = download_app!(db, create_test_config(), pg_store(&db), Arc::new(test_signer()));

    let req = download_request(&file.share_token, "203.0.113.5").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
    assert!(db.attempts_for(file.id).await.is_empty());
}

#[actix_web::test]
async fn test_issuer_failure_records_failed_attempt() {
    let db = TestDb::new().await;
    let file = create_test_file(&db.pool, "broken.zip").await;
    let app = download_app!(db, create_test_config(), pg_store(&db), Arc::new(FailingIssuer));

    let req = download_request(&file.share_token, "203.0.113.5").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 500);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Error generating download link");

    assert_eq!(
        db.attempts_for(file.id).await,
        vec![(false, "203.0.113.5".to_string())]
    );
    assert_eq!(db.download_count(file.id).await, 0);
}

#[actix_web::test]
async fn test_unavailable_store_fails_open() {
    let db = TestDb::new().await;
    let file = create_test_file(&db.pool, "open.txt").await;
    let app = download_app!(
        db,
        create_test_config(),
        Arc::new(UnavailableStore),
        Arc::new(test_signer())
    );

    for _ in 0..5 {
        let req = download_request(&file.share_token, "203.0.113.5").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["remainingAttempts"], 2);
    }
}

#[actix_web::test]
async fn test_trusted_header_list_is_configurable() {
    let db = TestDb::new().await;
    let file = create_test_file(&db.pool, "proxy.txt").await;
    let mut config = create_test_config();
    config.client_ip = ClientIpConfig::parse("x-real-ip").unwrap();
    let app = download_app!(db, config, pg_store(&db), Arc::new(test_signer()));

    let req = test::TestRequest::get()
        .uri(&format!("/api/download/{}", file.share_token))
        .insert_header(("cf-connecting-ip", "6.6.6.6"))
        .insert_header(("x-real-ip", "10.20.30.40"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    assert_eq!(
        db.attempts_for(file.id).await,
        vec![(true, "10.20.30.40".to_string())]
    );
}

#[actix_web::test]
async fn test_missing_user_agent_recorded_as_unknown() {
    let db = TestDb::new().await;
    let file = create_test_file(&db.pool, "agent.txt").await;
    let app = download_app!(db, create_test_config(), pg_store(&db), Arc::new(test_signer()));

    let req = test::TestRequest::get()
        .uri(&format!("/api/download/{}", file.share_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let agent: Option<String> =
        sqlx::query_scalar("SELECT user_agent FROM download_attempts WHERE file_id = $1")
            .bind(file.id)
            .fetch_one(&db.pool)
            .await
            .unwrap();
    assert_eq!(agent.as_deref(), Some("Unknown"));
}

// =============================================================================
// Check Limits Tests
// =============================================================================

#[actix_web::test]
async fn test_check_limits_reports_without_recording() {
    let db = TestDb::new().await;
    let file = create_test_file(&db.pool, "peek.txt").await;
    let app = download_app!(db, create_test_config(), pg_store(&db), Arc::new(test_signer()));

    for _ in 0..4 {
        let req = test::TestRequest::get()
            .uri(&format!("/api/check-limits/{}", file.share_token))
            .insert_header(("cf-connecting-ip", "203.0.113.5"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["canDownload"], true);
        assert_eq!(body["remainingAttempts"], 3);
        assert!(body.get("message").is_none());
    }

    assert!(db.attempts_for(file.id).await.is_empty());
}

#[actix_web::test]
async fn test_check_limits_after_quota_exhausted() {
    let db = TestDb::new().await;
    let file = create_test_file(&db.pool, "busy.txt").await;
    let app = download_app!(db, create_test_config(), pg_store(&db), Arc::new(test_signer()));

    for _ in 0..3 {
        let req = download_request(&file.share_token, "203.0.113.5").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
    }

    let req = test::TestRequest::get()
        .uri(&format!("/api/check-limits/{}", file.share_token))
        .insert_header(("cf-connecting-ip", "203.0.113.5"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["canDownload"], false);
    assert_eq!(body["remainingAttempts"], 0);
    assert!(body["message"].is_string());
}

#[actix_web::test]
async fn test_check_limits_unknown_token() {
    let db = TestDb::new().await;
    let app = download_app!(db, create_test_config(), pg_store(&db), Arc::new(test_signer()));

    let req = test::TestRequest::get()
        .uri("/api/check-limits/abc123")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}
