use actix_web::http::header::HeaderName;
use std::env;
use std::time::Duration;

use crate::locale::Locale;
use crate::services::download_limit::{
    DownloadPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_WINDOW_HOURS,
};

/// Header order used when TRUSTED_IP_HEADERS is not set
pub const DEFAULT_TRUSTED_IP_HEADERS: &[&str] = &["cf-connecting-ip", "x-real-ip", "x-forwarded-for"];

/// Longest accepted download window, one year
pub const MAX_WINDOW_HOURS: i64 = 365 * 24;

/// One year, the lifetime of download links unless configured otherwise
pub const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
    pub download_limit: DownloadLimitConfig,
    pub client_ip: ClientIpConfig,
    pub storage: StorageConfig,
    pub locale: Locale,
}

/// Database connection pool configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

/// Download quota configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLimitConfig {
    /// Successful downloads allowed per file and IP inside one window
    pub max_attempts: i64,
    /// Length of the rolling window in hours
    pub window_hours: i64,
}

/// Which proxy headers carry the client address, most trusted first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIpConfig {
    pub trusted_headers: Vec<String>,
}

/// Signed download URL configuration
#[derive(Clone)]
pub struct StorageConfig {
    /// Public base URL of the object storage front
    pub public_url: String,
    /// Shared HMAC secret. None means a random per-process secret.
    pub signing_secret: Option<String>,
    pub signed_url_ttl: Duration,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("public_url", &self.public_url)
            .field("signing_secret", &self.signing_secret.as_ref().map(|_| "<redacted>"))
            .field("signed_url_ttl", &self.signed_url_ttl)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let locale = match env::var("MESSAGES_LOCALE") {
            Ok(value) => value.parse().map_err(ConfigError::InvalidLocale)?,
            Err(_) => Locale::default(),
        };

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            database: DatabaseConfig::from_env()?,
            download_limit: DownloadLimitConfig::from_env()?,
            client_ip: ClientIpConfig::from_env()?,
            storage: StorageConfig::from_env(),
            locale,
        })
    }
}

impl DownloadLimitConfig {
    /// Load download limit configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let max_attempts = env::var("MAX_DOWNLOADS_PER_WINDOW")
            .unwrap_or_else(|_| DEFAULT_MAX_ATTEMPTS.to_string())
            .parse()
            .unwrap_or(DEFAULT_MAX_ATTEMPTS);
        let window_hours = env::var("DOWNLOAD_WINDOW_HOURS")
            .unwrap_or_else(|_| DEFAULT_WINDOW_HOURS.to_string())
            .parse()
            .unwrap_or(DEFAULT_WINDOW_HOURS);

        if max_attempts < 1 || !(1..=MAX_WINDOW_HOURS).contains(&window_hours) {
            return Err(ConfigError::InvalidDownloadLimit);
        }

        Ok(Self {
            max_attempts,
            window_hours,
        })
    }

    /// Fields set outside `from_env` are clamped to the accepted range
    pub fn policy(&self) -> DownloadPolicy {
        let window_hours = self.window_hours.clamp(1, MAX_WINDOW_HOURS);
        DownloadPolicy {
            max_attempts: self.max_attempts.max(1),
            window: chrono::Duration::hours(window_hours),
        }
    }
}

impl Default for DownloadLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            window_hours: DEFAULT_WINDOW_HOURS,
        }
    }
}

impl ClientIpConfig {
    /// Load trusted header names from TRUSTED_IP_HEADERS (comma-separated)
    pub fn from_env() -> Result<Self, ConfigError> {
        match env::var("TRUSTED_IP_HEADERS") {
            Ok(value) => Self::parse(&value),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Parses a comma-separated header list. An empty string trusts no headers.
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        let trusted_headers = value
            .split(',')
            .map(|name| name.trim().to_ascii_lowercase())
            .filter(|name| !name.is_empty())
            .map(|name| match HeaderName::from_bytes(name.as_bytes()) {
                Ok(_) => Ok(name),
                Err(_) => Err(ConfigError::InvalidHeaderName(name)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { trusted_headers })
    }
}

impl Default for ClientIpConfig {
    fn default() -> Self {
        Self {
            trusted_headers: DEFAULT_TRUSTED_IP_HEADERS
                .iter()
                .map(|h| h.to_string())
                .collect(),
        }
    }
}

impl StorageConfig {
    /// Load storage configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            public_url: env::var("STORAGE_PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:9000/files".to_string()),
            signing_secret: env::var("STORAGE_SIGNING_SECRET")
                .ok()
                .filter(|s| !s.is_empty()),
            signed_url_ttl: Duration::from_secs(
                env::var("SIGNED_URL_TTL_SECS")
                    .unwrap_or_else(|_| DEFAULT_SIGNED_URL_TTL_SECS.to_string())
                    .parse()
                    .unwrap_or(DEFAULT_SIGNED_URL_TTL_SECS),
            ),
        }
    }
}

impl DatabaseConfig {
    /// Load database configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)?;

        Ok(Self {
            url,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .unwrap_or(1),
            acquire_timeout: Duration::from_secs(
                env::var("DATABASE_ACQUIRE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            ),
            idle_timeout: Duration::from_secs(
                env::var("DATABASE_IDLE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "600".to_string())
                    .parse()
                    .unwrap_or(600),
            ),
            max_lifetime: Duration::from_secs(
                env::var("DATABASE_MAX_LIFETIME_SECS")
                    .unwrap_or_else(|_| "1800".to_string())
                    .parse()
                    .unwrap_or(1800),
            ),
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    MissingDatabaseUrl,
    InvalidDownloadLimit,
    InvalidHeaderName(String),
    InvalidLocale(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "PORT must be a valid number"),
            ConfigError::MissingDatabaseUrl => {
                write!(f, "DATABASE_URL environment variable is required")
            }
            ConfigError::InvalidDownloadLimit => write!(
                f,
                "MAX_DOWNLOADS_PER_WINDOW must be at least 1 and DOWNLOAD_WINDOW_HOURS between 1 and {}",
                MAX_WINDOW_HOURS
            ),
            ConfigError::InvalidHeaderName(name) => {
                write!(f, "TRUSTED_IP_HEADERS contains an invalid header name: {}", name)
            }
            ConfigError::InvalidLocale(locale) => {
                write!(f, "MESSAGES_LOCALE must be 'en' or 'es', got '{}'", locale)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
