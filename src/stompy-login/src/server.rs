//! Loopback HTTP listener receiving the OAuth redirect.
//!
//! Binds `127.0.0.1` on an OS-assigned port and serves `GET /callback`:
//! - a `state` that does not match is answered 400 and ignored
//! - a matching request carrying `code` is answered with a confirmation
//!   page and the code is delivered once on the result channel
//! - anything else (provider `error`) is answered 400 and nothing is
//!   delivered; the coordinator's timeout governs that path

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;

use crate::constants::{CALLBACK_PATH, SHUTDOWN_GRACE};
use crate::error::{AuthError, AuthResult};

const SUCCESS_HTML: &str = r#"<html>
<head><title>stompy</title></head>
<body>
    <h2>Authentication successful!</h2>
    <p>You can close this window and return to the terminal.</p>
    <script>window.close()</script>
</body>
</html>"#;

/// A running callback listener.
pub struct CallbackServer {
    /// Port the listener is bound to.
    pub port: u16,
    /// Receives the authorization code, at most once.
    pub code_rx: oneshot::Receiver<String>,
    /// Stops the listener.
    pub shutdown: ShutdownHandle,
}

impl CallbackServer {
    pub fn into_parts(self) -> (u16, oneshot::Receiver<String>, ShutdownHandle) {
        (self.port, self.code_rx, self.shutdown)
    }
}

/// Handle to stop the callback listener.
///
/// Cloneable and safe to call any number of times.
#[derive(Clone)]
pub struct ShutdownHandle {
    inner: Arc<ShutdownInner>,
}

struct ShutdownInner {
    stop_tx: Mutex<Option<oneshot::Sender<()>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ShutdownHandle {
    /// Stop the listener, waiting at most a few seconds for in-flight
    /// requests before aborting the server task.
    pub async fn shutdown(&self) {
        if let Some(tx) = self.inner.stop_tx.lock().await.take() {
            let _ = tx.send(());
        }

        let Some(mut task) = self.inner.task.lock().await.take() else {
            return;
        };
        if tokio::time::timeout(SHUTDOWN_GRACE, &mut task).await.is_err() {
            tracing::warn!(
                grace_secs = SHUTDOWN_GRACE.as_secs(),
                "Callback server did not stop gracefully, aborting"
            );
            task.abort();
        }
        tracing::debug!("Callback server stopped");
    }
}

#[derive(Clone)]
struct CallbackState {
    expected_state: Arc<str>,
    code_tx: Arc<Mutex<Option<oneshot::Sender<String>>>>,
}

/// Start the callback listener for one login attempt.
pub async fn start_callback_server(expected_state: &str) -> AuthResult<CallbackServer> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(AuthError::CallbackBind)?;
    let port = listener
        .local_addr()
        .map_err(AuthError::CallbackBind)?
        .port();

    let (code_tx, code_rx) = oneshot::channel();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let state = CallbackState {
        expected_state: Arc::from(expected_state),
        code_tx: Arc::new(Mutex::new(Some(code_tx))),
    };
    let app = Router::new()
        .route(CALLBACK_PATH, get(handle_callback))
        .with_state(state);

    let task = tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = stop_rx.await;
            })
            .await;
        if let Err(e) = result {
            tracing::debug!(error = %e, "Callback server exited with error");
        }
    });

    tracing::debug!(port, "Callback server listening");

    Ok(CallbackServer {
        port,
        code_rx,
        shutdown: ShutdownHandle {
            inner: Arc::new(ShutdownInner {
                stop_tx: Mutex::new(Some(stop_tx)),
                task: Mutex::new(Some(task)),
            }),
        },
    })
}

async fn handle_callback(
    State(state): State<CallbackState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let received = params.get("state").map(String::as_str).unwrap_or("");
    if !constant_time_compare(&state.expected_state, received) {
        tracing::warn!("OAuth callback rejected: state parameter mismatch");
        return (StatusCode::BAD_REQUEST, "Invalid state parameter").into_response();
    }

    if let Some(code) = params.get("code").filter(|c| !c.is_empty()) {
        if let Some(tx) = state.code_tx.lock().await.take() {
            let _ = tx.send(code.clone());
        } else {
            tracing::debug!("Authorization code already delivered, ignoring repeat");
        }
        return Html(SUCCESS_HTML).into_response();
    }

    let error = params.get("error").map(String::as_str).unwrap_or("");
    let description = params
        .get("error_description")
        .map(String::as_str)
        .unwrap_or("");
    tracing::warn!(error, description, "OAuth provider returned an error");
    (
        StatusCode::BAD_REQUEST,
        format!("Authentication failed: {error} - {description}"),
    )
        .into_response()
}

/// Constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn callback_url(port: u16, query: &str) -> String {
        format!("http://127.0.0.1:{port}{CALLBACK_PATH}?{query}")
    }

    #[tokio::test]
    async fn test_valid_code_is_delivered_once() {
        let server = start_callback_server("expected").await.unwrap();
        let (port, mut code_rx, shutdown) = server.into_parts();
        assert_ne!(port, 0);

        let resp = reqwest::get(callback_url(port, "code=abc123&state=expected"))
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let body = resp.text().await.unwrap();
        assert!(body.contains("Authentication successful!"));

        assert_eq!((&mut code_rx).await.unwrap(), "abc123");

        // A replayed redirect is answered but not delivered again
        let again = reqwest::get(callback_url(port, "code=other&state=expected"))
            .await
            .unwrap();
        assert_eq!(again.status(), reqwest::StatusCode::OK);

        shutdown.shutdown().await;
    }

    #[tokio::test]
    async fn test_state_mismatch_is_rejected() {
        let server = start_callback_server("expected").await.unwrap();
        let (port, mut code_rx, shutdown) = server.into_parts();

        let resp = reqwest::get(callback_url(port, "code=abc123&state=forged"))
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
        assert!(resp.text().await.unwrap().contains("Invalid state parameter"));

        assert!(matches!(
            code_rx.try_recv(),
            Err(oneshot::error::TryRecvError::Empty)
        ));
        shutdown.shutdown().await;
    }

    #[tokio::test]
    async fn test_missing_state_is_rejected() {
        let server = start_callback_server("expected").await.unwrap();
        let resp = reqwest::get(callback_url(server.port, "code=abc123"))
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
        server.shutdown.shutdown().await;
    }

    #[tokio::test]
    async fn test_provider_error_is_reported_not_delivered() {
        let server = start_callback_server("expected").await.unwrap();
        let (port, mut code_rx, shutdown) = server.into_parts();

        let resp = reqwest::get(callback_url(
            port,
            "error=access_denied&error_description=User%20denied&state=expected",
        ))
        .await
        .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
        let body = resp.text().await.unwrap();
        assert!(body.contains("access_denied"));
        assert!(body.contains("User denied"));

        assert!(matches!(
            code_rx.try_recv(),
            Err(oneshot::error::TryRecvError::Empty)
        ));
        shutdown.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent_and_bounded() {
        let server = start_callback_server("s").await.unwrap();
        let handle = server.shutdown.clone();

        let started = std::time::Instant::now();
        handle.shutdown().await;
        server.shutdown.shutdown().await;
        handle.shutdown().await;
        assert!(started.elapsed() < SHUTDOWN_GRACE + Duration::from_secs(1));

        // Listener is gone
        let result = reqwest::get(callback_url(server.port, "code=x&state=s")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_code_channel_closes_after_shutdown() {
        let server = start_callback_server("s").await.unwrap();
        let (_, code_rx, shutdown) = server.into_parts();
        shutdown.shutdown().await;
        assert!(code_rx.await.is_err());
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "ab"));
        assert!(!constant_time_compare("", "a"));
    }
}
