//! Stompy Login - browser-based OAuth for the stompy CLI.
//!
//! - PKCE verifier/challenge and CSRF state generation
//! - A one-shot loopback callback listener
//! - The end-to-end login coordinator
//! - Token freshness checks and refresh-token rotation

pub mod browser;
pub mod constants;
pub mod error;
pub mod flow;
pub mod pkce;
pub mod server;
pub mod token;
pub mod types;

pub use browser::{BrowserLauncher, SystemBrowser};
pub use constants::{CLIENT_ID, LOGIN_TIMEOUT, SCOPE, TOKEN_EXPIRY_BUFFER_SECS, auth_base};
pub use error::{AuthError, AuthResult};
pub use flow::{LoginFlow, exchange_code};
pub use pkce::{ChallengeMethod, PkcePair, generate_pkce, generate_state};
pub use server::{CallbackServer, ShutdownHandle, start_callback_server};
pub use token::{StoredToken, TokenStore, get_valid_token, is_expired, is_expired_at, refresh_token};
pub use types::{TokenRecord, TokenResponse};
