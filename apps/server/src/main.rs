use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use rand::Rng;
use std::sync::Arc;

use fileshare::config;
use fileshare::db;
use fileshare::routes;
use fileshare::storage::{AccessUrlIssuer, HmacUrlSigner};
use fileshare::store::{AttemptStore, PgAttemptStore};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Load configuration
    let config = config::Config::from_env().map_err(|e| {
        log::error!("Configuration error: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    log::info!("Starting Fileshare server on {}:{}", config.host, config.port);
    log::info!(
        "Download limit: {} per {}h per file and IP, trusted IP headers: {:?}",
        config.download_limit.max_attempts,
        config.download_limit.window_hours,
        config.client_ip.trusted_headers
    );

    // Create database pool and run migrations
    let db_pool = db::init(&config.database).await.map_err(|e| {
        log::error!("Database initialization error: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    // Signing secret from config or generate random (with warning)
    let signing_secret = match &config.storage.signing_secret {
        Some(secret) => secret.clone(),
        None => {
            log::warn!(
                "STORAGE_SIGNING_SECRET not set, using random secret (download links won't validate at the storage front)"
            );
            let random_bytes: Vec<u8> = (0..32).map(|_| rand::rng().random()).collect();
            hex::encode(random_bytes)
        }
    };

    let signer = HmacUrlSigner::new(
        &config.storage.public_url,
        signing_secret,
        config.storage.signed_url_ttl,
    )
    .map_err(|e| {
        log::error!("Storage configuration error: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let attempt_store: Arc<dyn AttemptStore> = Arc::new(PgAttemptStore::new(db_pool.clone()));
    let url_issuer: Arc<dyn AccessUrlIssuer> = Arc::new(signer);
    let attempt_store = web::Data::from(attempt_store);
    let url_issuer = web::Data::from(url_issuer);

    // Clone values for the closure
    let host = config.host.clone();
    let port = config.port;

    let server = HttpServer::new(move || {
        // The share page is served from another origin and only reads
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::ACCEPT,
                actix_web::http::header::CONTENT_TYPE,
            ])
            .max_age(3600);

        App::new()
            // Shared handles; gates and recorders are built per request around them
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(web::Data::new(config.clone()))
            .app_data(attempt_store.clone())
            .app_data(url_issuer.clone())
            // Middleware
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .wrap(cors)
            .configure(routes::health::configure)
            .configure(routes::downloads::configure)
            .configure(routes::files::configure)
    })
    .bind((host.as_str(), port))?
    .shutdown_timeout(30)
    .run();

    // Spawn graceful shutdown handler
    let server_handle = server.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        log::info!("Shutdown signal received, stopping server...");
        server_handle.stop(true).await;
    });

    server.await
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                log::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
