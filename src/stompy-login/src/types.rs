//! Token types exchanged with the OAuth provider.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::MAX_TOKEN_LIFETIME_SECS;

/// Body of a successful `POST /oauth/token`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds. Absent means already expired.
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Token record as persisted through the config store.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenRecord {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expiry: DateTime<Utc>,
    pub email: Option<String>,
}

impl TokenRecord {
    /// Record for a fresh token response, expiring `expires_in` seconds after `now`.
    ///
    /// The lifetime is clamped to `0..=MAX_TOKEN_LIFETIME_SECS`.
    pub fn from_response(resp: &TokenResponse, now: DateTime<Utc>, email: Option<String>) -> Self {
        let lifetime = resp.expires_in.clamp(0, MAX_TOKEN_LIFETIME_SECS);
        let expiry = TimeDelta::try_seconds(lifetime)
            .and_then(|d| now.checked_add_signed(d))
            .unwrap_or(now);
        Self {
            access_token: resp.access_token.clone(),
            refresh_token: resp.refresh_token.clone().filter(|t| !t.is_empty()),
            expiry,
            email,
        }
    }
}

impl std::fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRecord")
            .field("access_token", &"[REDACTED]")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expiry", &self.expiry)
            .field("email", &self.email)
            .finish()
    }
}
