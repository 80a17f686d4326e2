//! Token freshness and refresh-token rotation.
//!
//! Tokens are treated as expired five minutes early so a request is never
//! built with a token that lapses in flight. Refreshing is the only place
//! stored tokens are rotated without user interaction.

use chrono::{DateTime, TimeDelta, Utc};
use stompy_common::Config;

use crate::constants::{CLIENT_ID, TOKEN_EXPIRY_BUFFER_SECS, token_url};
use crate::error::{AuthError, AuthResult};
use crate::types::{TokenRecord, TokenResponse};

/// Stored credentials as read back from persistence.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct StoredToken {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Absent or unparseable expiry reads as already expired.
    pub expiry: Option<DateTime<Utc>>,
    pub email: Option<String>,
}

impl std::fmt::Debug for StoredToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredToken")
            .field("has_access_token", &self.access_token.is_some())
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expiry", &self.expiry)
            .field("email", &self.email)
            .finish()
    }
}

/// Where the token record lives.
pub trait TokenStore {
    fn load_token(&self) -> StoredToken;
    fn save_token(&mut self, record: &TokenRecord) -> AuthResult<()>;
}

impl TokenStore for Config {
    fn load_token(&self) -> StoredToken {
        StoredToken {
            access_token: self.access_token().map(str::to_string),
            refresh_token: self.refresh_token().map(str::to_string),
            expiry: self.token_expiry(),
            email: self.email().map(str::to_string),
        }
    }

    fn save_token(&mut self, record: &TokenRecord) -> AuthResult<()> {
        self.save_tokens(
            &record.access_token,
            record.refresh_token.as_deref(),
            record.expiry,
            record.email.as_deref(),
            None,
        )
        .map_err(|e| AuthError::Persist(e.to_string()))
    }
}

/// True when `now >= expiry - 5 minutes`.
pub fn is_expired(expiry: DateTime<Utc>) -> bool {
    is_expired_at(expiry, Utc::now())
}

pub fn is_expired_at(expiry: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    expiry
        .checked_sub_signed(TimeDelta::seconds(TOKEN_EXPIRY_BUFFER_SECS))
        .is_none_or(|deadline| now >= deadline)
}

/// Trade a refresh token for a new token pair (`grant_type=refresh_token`).
pub async fn refresh_token(
    http: &reqwest::Client,
    api_url: &str,
    refresh_token: &str,
) -> AuthResult<TokenResponse> {
    let response = http
        .post(token_url(api_url))
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", CLIENT_ID),
        ])
        .send()
        .await
        .map_err(|e| AuthError::RefreshFailed(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!(status = %status, "Token refresh request failed");
        return Err(AuthError::RefreshFailed(format!("status {}", status.as_u16())));
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| AuthError::RefreshFailed(format!("decoding refresh response: {e}")))
}

/// A non-expired access token, refreshing and persisting a new pair first
/// when the stored one is stale.
pub async fn get_valid_token<S: TokenStore>(
    http: &reqwest::Client,
    store: &mut S,
    api_url: &str,
) -> AuthResult<String> {
    let stored = store.load_token();
    let access_token = stored
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::NotAuthenticated)?;

    if let Some(expiry) = stored.expiry
        && !is_expired(expiry)
    {
        return Ok(access_token);
    }

    let rt = stored
        .refresh_token
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::ExpiredNoRefresh)?;

    tracing::debug!("Access token expired, refreshing");
    let response = refresh_token(http, api_url, &rt).await?;
    let record = TokenRecord::from_response(&response, Utc::now(), stored.email);
    store.save_token(&record)?;

    tracing::info!("Successfully refreshed access token");
    Ok(record.access_token)
}
