//! Constants for the OAuth login flow.

use std::time::Duration;

/// OAuth client identifier registered for the CLI.
pub const CLIENT_ID: &str = "stompy-cli";

/// Scopes requested at authorization time.
pub const SCOPE: &str = "openid profile email";

/// How long the coordinator waits for the browser redirect.
pub const LOGIN_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Tokens are treated as expired this many seconds before their real expiry.
pub const TOKEN_EXPIRY_BUFFER_SECS: i64 = 5 * 60;

/// Longest token lifetime honored from a server response.
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Upper bound on graceful shutdown of the callback listener.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Path served by the callback listener.
pub const CALLBACK_PATH: &str = "/callback";

/// Entropy drawn for a PKCE verifier, in bytes.
pub const VERIFIER_BYTES: usize = 32;

/// Entropy drawn for a CSRF state value, in bytes.
pub const STATE_BYTES: usize = 16;

/// API path suffix stripped to obtain the OAuth provider base.
const API_PATH_SUFFIX: &str = "/api/v1";

/// OAuth provider base for an API URL.
///
/// `https://api.stompy.ai/api/v1` becomes `https://api.stompy.ai`.
pub fn auth_base(api_url: &str) -> String {
    let trimmed = api_url.trim_end_matches('/');
    trimmed
        .strip_suffix(API_PATH_SUFFIX)
        .unwrap_or(trimmed)
        .to_string()
}

/// Token endpoint for an API URL.
pub fn token_url(api_url: &str) -> String {
    format!("{}/oauth/token", auth_base(api_url))
}
