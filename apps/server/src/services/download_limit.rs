//! Per-file, per-IP download quota.
//!
//! [`DownloadGate`] counts successful attempts in a rolling window and decides
//! whether another download may start. [`AttemptRecorder`] appends every
//! attempt, successful or not, to the same log. Both are cheap wrappers around
//! a borrowed [`AttemptStore`] and are built per request.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::locale::Locale;
use crate::models::NewDownloadAttempt;
use crate::store::{AttemptFilter, AttemptStore, StoreError};

/// Downloads allowed per file and IP inside one window
pub const DEFAULT_MAX_ATTEMPTS: i64 = 3;

/// Length of the rolling window, in hours
pub const DEFAULT_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadPolicy {
    pub max_attempts: i64,
    pub window: Duration,
}

impl Default for DownloadPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            window: Duration::hours(DEFAULT_WINDOW_HOURS),
        }
    }
}

/// Outcome of a limit check, serialized as the check-limits response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitCheck {
    pub can_download: bool,
    pub remaining_attempts: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// When the next slot frees up. Only set on rejection.
    #[serde(skip)]
    pub retry_at: Option<DateTime<Utc>>,
}

impl LimitCheck {
    /// Seconds until `retry_at`, at least 1
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> Option<u64> {
        self.retry_at
            .map(|at| (at - now).num_seconds().max(1) as u64)
    }
}

/// Reasons the gate did not return a plain remaining count
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("download limit of {max_attempts} reached, next slot at {retry_at}")]
    QuotaExceeded {
        max_attempts: i64,
        retry_at: DateTime<Utc>,
    },

    #[error("could not count download attempts: {0}")]
    Store(#[from] StoreError),

    #[error("download window of {0} does not fit the clock range")]
    WindowOutOfRange(Duration),
}

/// What the gate does with a [`GateError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Block the download
    Reject,
    /// Let the download through with the full quota
    FailOpen,
}

impl GateError {
    pub fn policy(&self) -> FailurePolicy {
        match self {
            GateError::QuotaExceeded { .. } => FailurePolicy::Reject,
            GateError::Store(_) | GateError::WindowOutOfRange(_) => FailurePolicy::FailOpen,
        }
    }
}

/// Decides whether a (file, ip) pair may download right now. Never writes.
pub struct DownloadGate<'a> {
    store: &'a dyn AttemptStore,
    policy: DownloadPolicy,
    locale: Locale,
}

impl<'a> DownloadGate<'a> {
    pub fn new(store: &'a dyn AttemptStore, policy: DownloadPolicy, locale: Locale) -> Self {
        Self {
            store,
            policy,
            locale,
        }
    }

    /// Checks the quota against the current time
    pub async fn check_download_limit(&self, file_id: Uuid, ip_address: &str) -> LimitCheck {
        self.check_at(file_id, ip_address, Utc::now()).await
    }

    /// Checks the quota as seen at `now`
    pub async fn check_at(&self, file_id: Uuid, ip_address: &str, now: DateTime<Utc>) -> LimitCheck {
        match self.evaluate(file_id, ip_address, now).await {
            Ok(remaining) => LimitCheck {
                can_download: true,
                remaining_attempts: remaining,
                message: None,
                retry_at: None,
            },
            Err(err) => self.resolve(file_id, ip_address, err),
        }
    }

    /// Returns the remaining attempts, or why there are none to give
    pub async fn evaluate(
        &self,
        file_id: Uuid,
        ip_address: &str,
        now: DateTime<Utc>,
    ) -> Result<i64, GateError> {
        let window = self.policy.window;
        let after = now
            .checked_sub_signed(window)
            .ok_or(GateError::WindowOutOfRange(window))?;
        let filter = AttemptFilter {
            file_id,
            ip_address: ip_address.to_string(),
            after,
        };

        let mut counted: Vec<DateTime<Utc>> = self
            .store
            .query(&filter)
            .await?
            .into_iter()
            .map(|a| a.downloaded_at)
            .collect();
        counted.sort_unstable();

        let count = counted.len() as i64;
        if count >= self.policy.max_attempts {
            // A slot frees up once enough of the oldest attempts have aged out
            let oldest = counted
                .get((count - self.policy.max_attempts) as usize)
                .copied()
                .unwrap_or(now);
            let retry_at = oldest
                .checked_add_signed(window)
                .ok_or(GateError::WindowOutOfRange(window))?;

            return Err(GateError::QuotaExceeded {
                max_attempts: self.policy.max_attempts,
                retry_at,
            });
        }

        Ok(self.policy.max_attempts - count)
    }

    fn resolve(&self, file_id: Uuid, ip_address: &str, err: GateError) -> LimitCheck {
        if let (FailurePolicy::Reject, GateError::QuotaExceeded { retry_at, .. }) =
            (err.policy(), &err)
        {
            let retry_hint = retry_at.to_rfc3339_opts(SecondsFormat::Secs, true);
            return LimitCheck {
                can_download: false,
                remaining_attempts: 0,
                message: Some(self.locale.limit_reached(
                    self.policy.max_attempts,
                    self.policy.window.num_hours(),
                    &retry_hint,
                )),
                retry_at: Some(*retry_at),
            };
        }

        log::error!(
            "Download limit check failed for file {} from {}, allowing download: {}",
            file_id,
            ip_address,
            err
        );
        LimitCheck {
            can_download: true,
            remaining_attempts: self.policy.max_attempts,
            message: Some(self.locale.limit_check_unavailable().to_string()),
            retry_at: None,
        }
    }
}

/// Appends download attempts to the log. Write failures are logged and dropped.
pub struct AttemptRecorder<'a> {
    store: &'a dyn AttemptStore,
}

impl<'a> AttemptRecorder<'a> {
    pub fn new(store: &'a dyn AttemptStore) -> Self {
        Self { store }
    }

    /// Records one attempt. Not idempotent: call exactly once per attempt.
    pub async fn record_download_attempt(
        &self,
        file_id: Uuid,
        ip_address: &str,
        user_agent: Option<&str>,
        success: bool,
    ) {
        let attempt = NewDownloadAttempt {
            file_id,
            ip_address: ip_address.to_string(),
            user_agent: user_agent.map(str::to_string),
            success,
        };

        if let Err(e) = self.store.insert(attempt).await {
            log::warn!(
                "Failed to record download attempt (file={}, ip={}, success={}): {}",
                file_id,
                ip_address,
                success,
                e
            );
        }
    }
}
