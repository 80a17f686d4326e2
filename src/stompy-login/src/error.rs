//! Authentication errors.

use std::time::Duration;

/// Errors raised while logging in or maintaining tokens.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The system random source failed. Never retried.
    #[error("failed to gather randomness: {0}")]
    Entropy(String),

    #[error("starting callback server: {0}")]
    CallbackBind(#[source] std::io::Error),

    #[error("callback server stopped before an authorization code arrived")]
    CallbackClosed,

    #[error("login timed out after {} seconds, please try again", .0.as_secs())]
    LoginTimeout(Duration),

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error("not logged in. Run 'stompy login'")]
    NotAuthenticated,

    #[error("token expired and no refresh token available. Run 'stompy login'")]
    ExpiredNoRefresh,

    #[error("token refresh failed ({0}). Run 'stompy login' again")]
    RefreshFailed(String),

    #[error("saving tokens: {0}")]
    Persist(String),

    #[error("could not open browser: {0}")]
    Browser(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

impl AuthError {
    /// Whether the user has to run `stompy login` to recover.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            AuthError::NotAuthenticated
                | AuthError::ExpiredNoRefresh
                | AuthError::RefreshFailed(_)
                | AuthError::LoginTimeout(_)
                | AuthError::TokenExchange(_)
        )
    }
}

pub type AuthResult<T> = std::result::Result<T, AuthError>;
