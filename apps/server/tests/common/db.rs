//! Database test utilities
//!
//! Provides helpers for setting up test databases with testcontainers.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use testcontainers::{runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::postgres::Postgres;
use uuid::Uuid;

/// A test database container with connection pool
pub struct TestDb {
    /// The running PostgreSQL container
    #[allow(dead_code)]
    container: ContainerAsync<Postgres>,
    /// Connection pool to the test database
    pub pool: PgPool,
}

impl TestDb {
    /// Creates a new test database with a fresh PostgreSQL container
    pub async fn new() -> Self {
        let container = Postgres::default()
            .start()
            .await
            .expect("Failed to start PostgreSQL container");

        let host = container.get_host().await.expect("Failed to get host");
        let port = container
            .get_host_port_ipv4(5432)
            .await
            .expect("Failed to get port");

        let database_url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

        let pool = PgPool::connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        // Enable pgcrypto extension for gen_random_uuid()
        sqlx::query("CREATE EXTENSION IF NOT EXISTS pgcrypto")
            .execute(&pool)
            .await
            .expect("Failed to enable pgcrypto extension");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        TestDb { container, pool }
    }

    /// Inserts an attempt with an explicit timestamp, bypassing the store
    pub async fn insert_attempt_at(
        &self,
        file_id: Uuid,
        ip_address: &str,
        success: bool,
        downloaded_at: DateTime<Utc>,
    ) {
        sqlx::query(
            r#"
            INSERT INTO download_attempts (file_id, ip_address, user_agent, success, downloaded_at)
            VALUES ($1, $2, 'fixture', $3, $4)
            "#,
        )
        .bind(file_id)
        .bind(ip_address)
        .bind(success)
        .bind(downloaded_at)
        .execute(&self.pool)
        .await
        .expect("Failed to insert attempt");
    }

    /// Returns (success, ip_address) for every attempt on a file, oldest first
    pub async fn attempts_for(&self, file_id: Uuid) -> Vec<(bool, String)> {
        sqlx::query_as::<_, (bool, String)>(
            "SELECT success, ip_address FROM download_attempts WHERE file_id = $1 ORDER BY downloaded_at",
        )
        .bind(file_id)
        .fetch_all(&self.pool)
        .await
        .expect("Failed to read attempts")
    }

    pub async fn download_count(&self, file_id: Uuid) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT download_count FROM files WHERE id = $1")
            .bind(file_id)
            .fetch_one(&self.pool)
            .await
            .expect("Failed to read download count")
    }

    pub async fn set_public(&self, file_id: Uuid, is_public: bool) {
        sqlx::query("UPDATE files SET is_public = $2 WHERE id = $1")
            .bind(file_id)
            .bind(is_public)
            .execute(&self.pool)
            .await
            .expect("Failed to update file");
    }
}
