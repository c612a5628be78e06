//! In-memory access token cache with expiry tracking.

use chrono::{DateTime, Duration, Utc};
use zeroize::Zeroizing;

use crate::error::AuthError;

/// A cached access token and when it expires.
#[derive(Clone)]
pub struct CachedToken {
    access_token: Zeroizing<String>,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

/// Single-token cache that treats a token as stale once it is within
/// `refresh_margin` of its expiry.
pub struct TokenCache {
    token: Option<CachedToken>,
    refresh_margin: Duration,
}

impl TokenCache {
    /// Create a new empty cache.
    pub fn new(refresh_before_expiry_seconds: u64) -> Result<Self, AuthError> {
        let refresh_margin = seconds(refresh_before_expiry_seconds).ok_or_else(|| {
            AuthError::ClientSetup(format!(
                "refresh margin of {}s is out of range",
                refresh_before_expiry_seconds
            ))
        })?;

        Ok(Self {
            token: None,
            refresh_margin,
        })
    }

    /// Get the cached token if it is still usable.
    pub fn get(&self) -> Option<&CachedToken> {
        self.token
            .as_ref()
            .filter(|cached| self.is_valid(&cached.expires_at))
    }

    /// Store a freshly issued token.
    ///
    /// Fails when `expires_in_seconds` does not yield a representable expiry.
    pub fn set(
        &mut self,
        access_token: String,
        expires_in_seconds: u64,
    ) -> Result<&CachedToken, AuthError> {
        let expires_at = seconds(expires_in_seconds)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                AuthError::InvalidTokenResponse(format!(
                    "expires_in out of range: {}",
                    expires_in_seconds
                ))
            })?;

        Ok(self.token.insert(CachedToken {
            access_token: Zeroizing::new(access_token),
            expires_at,
        }))
    }

    /// Invalidate the cache.
    pub fn invalidate(&mut self) {
        self.token = None;
    }

    /// Check if a token expiring at `expires_at` is still usable.
    pub fn is_valid(&self, expires_at: &DateTime<Utc>) -> bool {
        Utc::now()
            .checked_add_signed(self.refresh_margin)
            .is_some_and(|stale_after| stale_after < *expires_at)
    }

    /// Check if the cache needs a new token.
    pub fn needs_refresh(&self) -> bool {
        self.get().is_none()
    }
}

fn seconds(value: u64) -> Option<Duration> {
    i64::try_from(value).ok().and_then(Duration::try_seconds)
}

/// Calculate the remaining time until token expiry.
pub fn time_until_expiry(expires_at: DateTime<Utc>) -> Option<Duration> {
    let now = Utc::now();

    if expires_at > now {
        Some(expires_at - now)
    } else {
        None
    }
}

/// Format duration as human-readable string (e.g., "45 min", "1 hour").
pub fn format_duration(duration: Duration) -> String {
    let total_minutes = duration.num_minutes();

    if total_minutes < 1 {
        "< 1 min".to_string()
    } else if total_minutes < 60 {
        format!("{} min", total_minutes)
    } else {
        let hours = total_minutes / 60;
        let mins = total_minutes % 60;
        if mins == 0 {
            format!("{} hour{}", hours, if hours == 1 { "" } else { "s" })
        } else {
            format!("{}h {}m", hours, mins)
        }
    }
}
