//! HMAC-SHA256 signed URLs.
//!
//! The storage front (CDN or object gateway) shares the secret and accepts a
//! request for `<base>/<path>?expires=<unix>&signature=<sig>` when the signature
//! over `"<path>\n<expires>"` matches and `expires` lies in the future.

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;
use url::Url;

use super::{AccessUrlIssuer, StorageError};

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct HmacUrlSigner {
    base_url: Url,
    secret: String,
    ttl: Duration,
}

impl std::fmt::Debug for HmacUrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacUrlSigner")
            .field("base_url", &self.base_url.as_str())
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl HmacUrlSigner {
    pub fn new(base_url: &str, secret: impl Into<String>, ttl: Duration) -> Result<Self, StorageError> {
        let base_url =
            Url::parse(base_url).map_err(|e| StorageError::InvalidBaseUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(StorageError::InvalidBaseUrl(base_url.to_string()));
        }

        Ok(Self {
            base_url,
            secret: secret.into(),
            ttl,
        })
    }

    /// Signs `storage_path` with an expiry of `now + ttl`
    pub fn issue_at(&self, storage_path: &str, now: DateTime<Utc>) -> Result<String, StorageError> {
        let path = normalize_path(storage_path)?;
        let expires = now.timestamp().saturating_add(self.ttl.as_secs() as i64);
        let signature = self.sign(&path, expires);

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StorageError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(path.split('/'));
        url.query_pairs_mut()
            .append_pair("expires", &expires.to_string())
            .append_pair("signature", &signature);

        Ok(url.to_string())
    }

    /// Checks a signature produced by [`issue_at`](Self::issue_at)
    pub fn verify(&self, storage_path: &str, expires: i64, signature: &str, now: DateTime<Utc>) -> bool {
        if expires <= now.timestamp() {
            return false;
        }
        let Ok(path) = normalize_path(storage_path) else {
            return false;
        };
        let Ok(provided) = URL_SAFE_NO_PAD.decode(signature) else {
            return false;
        };

        let mut mac = self.mac();
        mac.update(signing_payload(&path, expires).as_bytes());
        mac.verify_slice(&provided).is_ok()
    }

    fn sign(&self, path: &str, expires: i64) -> String {
        let mut mac = self.mac();
        mac.update(signing_payload(path, expires).as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(self.secret.as_bytes()).expect("HMAC can take key of any size")
    }
}

#[async_trait]
impl AccessUrlIssuer for HmacUrlSigner {
    async fn issue(&self, storage_path: &str) -> Result<String, StorageError> {
        self.issue_at(storage_path, Utc::now())
    }
}

fn signing_payload(path: &str, expires: i64) -> String {
    format!("{}\n{}", path, expires)
}

/// Strips leading slashes and rejects empty or `.`/`..` segments
fn normalize_path(storage_path: &str) -> Result<String, StorageError> {
    let path = storage_path.trim().trim_start_matches('/');
    if path.is_empty() {
        return Err(StorageError::InvalidPath("empty path".to_string()));
    }
    if path
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(StorageError::InvalidPath(storage_path.to_string()));
    }
    Ok(path.to_string())
}
