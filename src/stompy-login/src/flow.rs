//! End-to-end OAuth authorization-code login with PKCE.
//!
//! 1. Generate a PKCE pair and CSRF state
//! 2. Start the loopback callback listener
//! 3. Open the browser on the provider's authorize page
//! 4. Wait (bounded) for the authorization code
//! 5. Exchange the code for tokens
//!
//! Persisting the resulting tokens is left to the caller.

use std::io::Write as _;
use std::time::Duration;

use zeroize::Zeroizing;

use crate::browser::{BrowserLauncher, SystemBrowser};
use crate::constants::{CALLBACK_PATH, CLIENT_ID, LOGIN_TIMEOUT, SCOPE, auth_base, token_url};
use crate::error::{AuthError, AuthResult};
use crate::pkce::{ChallengeMethod, generate_pkce, generate_state};
use crate::server::start_callback_server;
use crate::types::TokenResponse;

/// One browser-based login against the provider behind `api_url`.
pub struct LoginFlow {
    api_url: String,
    http: reqwest::Client,
    timeout: Duration,
    browser: Box<dyn BrowserLauncher>,
}

impl LoginFlow {
    pub fn new(api_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            api_url: api_url.into(),
            http,
            timeout: LOGIN_TIMEOUT,
            browser: Box::new(SystemBrowser),
        }
    }

    /// Override how long to wait for the redirect.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_browser(mut self, browser: impl BrowserLauncher + 'static) -> Self {
        self.browser = Box::new(browser);
        self
    }

    /// Provider authorize URL for one attempt. Dynamic values are percent-encoded.
    pub fn authorize_url(&self, redirect_uri: &str, challenge: &str, state: &str) -> String {
        format!(
            "{}/oauth/authorize?client_id={}&redirect_uri={}&code_challenge={}&code_challenge_method={}&response_type=code&scope={}&state={}",
            auth_base(&self.api_url),
            urlencoding::encode(CLIENT_ID),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(challenge),
            ChallengeMethod::S256,
            urlencoding::encode(SCOPE),
            urlencoding::encode(state),
        )
    }

    /// Run the login and return the provider's token response.
    pub async fn run(&self) -> AuthResult<TokenResponse> {
        let pkce = generate_pkce()?;
        let state = Zeroizing::new(generate_state()?);

        let (port, code_rx, shutdown) = start_callback_server(&state).await?.into_parts();
        let redirect_uri = format!("http://localhost:{port}{CALLBACK_PATH}");
        let url = self.authorize_url(&redirect_uri, &pkce.challenge, &state);

        println!("Opening browser to authenticate...");
        println!("If the browser doesn't open, visit:\n  {url}\n");

        if let Err(e) = self.browser.open(&url) {
            tracing::warn!(error = %e, "Failed to launch browser");
            println!("Could not open browser: {e}");
        }

        print!("Waiting for authentication...");
        let _ = std::io::stdout().flush();

        let outcome = tokio::time::timeout(self.timeout, code_rx).await;
        shutdown.shutdown().await;

        let code = match outcome {
            Ok(Ok(code)) => {
                println!(" Done!");
                Zeroizing::new(code)
            }
            Ok(Err(_)) => {
                println!(" Failed.");
                return Err(AuthError::CallbackClosed);
            }
            Err(_) => {
                println!(" Timed out.");
                return Err(AuthError::LoginTimeout(self.timeout));
            }
        };

        exchange_code(
            &self.http,
            &self.api_url,
            &code,
            &pkce.verifier,
            &redirect_uri,
        )
        .await
    }
}

/// Exchange an authorization code for tokens (`grant_type=authorization_code`).
pub async fn exchange_code(
    http: &reqwest::Client,
    api_url: &str,
    code: &str,
    verifier: &str,
    redirect_uri: &str,
) -> AuthResult<TokenResponse> {
    let response = http
        .post(token_url(api_url))
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("code_verifier", verifier),
            ("redirect_uri", redirect_uri),
            ("client_id", CLIENT_ID),
        ])
        .send()
        .await
        .map_err(|e| AuthError::TokenExchange(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = %status, body = %body, "Token exchange rejected");
        return Err(AuthError::TokenExchange(format!(
            "server responded with status {}",
            status.as_u16()
        )));
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| AuthError::TokenExchange(format!("decoding token response: {e}")))
}
