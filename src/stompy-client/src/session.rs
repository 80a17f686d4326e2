//! Resilient transport for the stompy API.
//!
//! One [`Session`] per command invocation. It owns the per-process state the
//! server negotiates (advertised API version, the one-time compatibility
//! warning) and the one-shot no-cache directive.

use std::time::Instant;

use bytes::Bytes;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE, HeaderMap};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use stompy_common::{DEFAULT_TIMEOUT, create_client, user_agent_for};

use crate::compat::check_compat;
use crate::error::{ApiError, ClientError, ClientResult};
use crate::retry::{RetryPolicy, is_retryable_status};

/// Server API version, cached for introspection.
pub const API_VERSION_HEADER: &str = "X-Stompy-API-Version";

/// Oldest client version the server fully supports.
pub const MIN_CLI_VERSION_HEADER: &str = "X-Stompy-Min-CLI-Version";

const BODY_PREVIEW_CHARS: usize = 200;

/// Query parameters as `(name, value)` pairs.
pub type Query<'a> = [(&'a str, String)];

/// Per-invocation HTTP session.
pub struct Session {
    http: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
    version: String,
    user_agent: String,
    retry: RetryPolicy,
    api_version: Option<String>,
    compat_warned: bool,
    no_cache: bool,
}

impl Session {
    /// Create a session against `base_url` (trailing slashes are ignored).
    ///
    /// `version` is the client's own version; empty or `dev` disables the
    /// compatibility check.
    pub fn new(
        base_url: &str,
        auth_token: Option<String>,
        version: &str,
    ) -> ClientResult<Self> {
        let user_agent = user_agent_for(version);
        let http = create_client(&user_agent, DEFAULT_TIMEOUT).map_err(ClientError::HttpClient)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: auth_token.filter(|t| !t.is_empty()),
            version: version.to_string(),
            user_agent,
            retry: RetryPolicy::default(),
            api_version: None,
            compat_warned: false,
            no_cache: false,
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// API version advertised by the server, once seen.
    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    pub fn compat_warned(&self) -> bool {
        self.compat_warned
    }

    /// Send `Cache-Control: no-cache` on the next request only.
    pub fn set_no_cache(&mut self) {
        self.no_cache = true;
    }

    pub fn no_cache_pending(&self) -> bool {
        self.no_cache
    }

    /// Execute one logical call and return the raw body and status.
    ///
    /// Idempotent methods are retried on transport errors and 502/503/504;
    /// POST and PATCH are attempted exactly once. Non-2xx responses become
    /// [`ClientError::Api`].
    pub async fn execute<B: Serialize + ?Sized>(
        &mut self,
        method: Method,
        path: &str,
        body: Option<&B>,
        query: &Query<'_>,
    ) -> ClientResult<(Bytes, StatusCode)> {
        let payload = match body {
            Some(b) => Some(serde_json::to_vec(b).map_err(ClientError::Encode)?),
            None => None,
        };
        self.send(method, path, payload, query).await
    }

    async fn send(
        &mut self,
        method: Method,
        path: &str,
        payload: Option<Vec<u8>>,
        query: &Query<'_>,
    ) -> ClientResult<(Bytes, StatusCode)> {
        let url = format!("{}{}", self.base_url, path);

        tracing::debug!(method = %method, url = %url, query = ?query, "--> request");
        if let Some(p) = &payload {
            tracing::debug!(body = %preview(p), "--> request body");
        }

        // Consumed by the first attempt only
        let no_cache = std::mem::take(&mut self.no_cache);
        let max_retries = self.retry.retries_for(&method);
        let mut last_error = None;

        for attempt in 0..=max_retries {
            if attempt > 0 {
                let delay = self.retry.delay_for(attempt);
                tracing::debug!(
                    attempt,
                    max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying request"
                );
                tokio::time::sleep(delay).await;
            }

            let mut request = self.http.request(method.clone(), &url);
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(token) = &self.auth_token {
                request = request.bearer_auth(token);
            }
            if no_cache && attempt == 0 {
                request = request.header(CACHE_CONTROL, "no-cache");
            }
            if let Some(p) = &payload {
                request = request
                    .header(CONTENT_TYPE, "application/json")
                    .body(p.clone());
            }

            let started = Instant::now();
            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    tracing::debug!(
                        attempt,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        error = %e,
                        "<-- transport error"
                    );
                    last_error = Some(ClientError::Transport(e));
                    continue;
                }
            };

            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await.map_err(ClientError::Body)?;

            tracing::debug!(
                status = status.as_u16(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                bytes = body.len(),
                "<-- response"
            );
            if let Some(x_cache) = header_str(&headers, "X-Cache") {
                tracing::debug!(x_cache, "<-- cache status");
            }

            self.observe_headers(&headers);

            if is_retryable_status(status) {
                last_error = Some(ApiError::from_response(status, &body).into());
                continue;
            }

            if !status.is_success() {
                tracing::debug!(body = %preview(&body), "<-- error body");
                return Err(ApiError::from_response(status, &body).into());
            }

            return Ok((body, status));
        }

        Err(last_error.unwrap_or_else(|| {
            ApiError::from_response(StatusCode::SERVICE_UNAVAILABLE, b"").into()
        }))
    }

    fn observe_headers(&mut self, headers: &HeaderMap) {
        if let Some(v) = header_str(headers, API_VERSION_HEADER) {
            self.api_version = Some(v.to_string());
        }

        if self.compat_warned {
            return;
        }
        if let Some(min) = header_str(headers, MIN_CLI_VERSION_HEADER)
            && let Some(warning) = check_compat(&self.version, min)
        {
            eprintln!("{warning}");
            self.compat_warned = true;
        }
    }

    /// GET and decode JSON.
    pub async fn get<T: DeserializeOwned>(&mut self, path: &str, query: &Query<'_>) -> ClientResult<T> {
        let (body, _) = self.send(Method::GET, path, None, query).await?;
        decode(&body)
    }

    /// POST a JSON body and decode the JSON response.
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &mut self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let (body, _) = self.execute(Method::POST, path, Some(body), &[]).await?;
        decode(&body)
    }

    /// PUT a JSON body and decode the JSON response.
    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &mut self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let (body, _) = self.execute(Method::PUT, path, Some(body), &[]).await?;
        decode(&body)
    }

    /// DELETE, discarding any response body.
    pub async fn delete(&mut self, path: &str, query: &Query<'_>) -> ClientResult<()> {
        self.send(Method::DELETE, path, None, query).await?;
        Ok(())
    }

    /// DELETE and decode the body, unless the server sent 204 or nothing.
    pub async fn delete_with_result<T: DeserializeOwned>(
        &mut self,
        path: &str,
        query: &Query<'_>,
    ) -> ClientResult<Option<T>> {
        let (body, status) = self.send(Method::DELETE, path, None, query).await?;
        if status == StatusCode::NO_CONTENT || body.is_empty() {
            return Ok(None);
        }
        decode(&body).map(Some)
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> ClientResult<T> {
    serde_json::from_slice(body).map_err(ClientError::Decode)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn preview(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.chars().count() > BODY_PREVIEW_CHARS {
        let cut: String = text.chars().take(BODY_PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        text.into_owned()
    }
}

/// Percent-encode one path segment.
pub(crate) fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(5),
        }
    }

    fn session(server: &MockServer, token: Option<&str>, version: &str) -> Session {
        Session::new(&server.uri(), token.map(str::to_string), version)
            .unwrap()
            .with_retry_policy(fast_retry())
    }

    async fn request_count(server: &MockServer) -> usize {
        server.received_requests().await.unwrap_or_default().len()
    }

    #[tokio::test]
    async fn test_get_retries_once_after_bad_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects"))
            .respond_with(ResponseTemplate::new(502))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
            .with_priority(2)
            .mount(&server)
            .await;

        let mut s = session(&server, None, "1.0.0");
        let (body, status) = s
            .execute::<()>(Method::GET, "/projects", None, &[])
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], br#"{"ok":true}"#);
        assert_eq!(request_count(&server).await, 2);
    }

    #[tokio::test]
    async fn test_post_is_never_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let mut s = session(&server, None, "1.0.0");
        let err = s
            .execute(Method::POST, "/projects", Some(&serde_json::json!({"name": "x"})), &[])
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(502));
        assert_eq!(request_count(&server).await, 1);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(404).set_body_string(r#"{"message":"project not found"}"#),
            )
            .mount(&server)
            .await;

        let mut s = session(&server, None, "1.0.0");
        let err = s
            .execute::<()>(Method::GET, "/projects/missing", None, &[])
            .await
            .unwrap_err();
        match err {
            ClientError::Api(api) => {
                assert_eq!(api.status_code, 404);
                assert_eq!(api.message, "project not found");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(request_count(&server).await, 1);
    }

    #[tokio::test]
    async fn test_persistent_unavailable_exhausts_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let mut s = session(&server, None, "1.0.0");
        let err = s
            .execute::<()>(Method::GET, "/projects", None, &[])
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(503));
        assert_eq!(request_count(&server).await, 3);
    }

    #[tokio::test]
    async fn test_transport_error_is_retried_then_surfaced() {
        // Nothing listens on the discard port
        let mut s = Session::new("http://127.0.0.1:9", None, "1.0.0")
            .unwrap()
            .with_retry_policy(fast_retry());
        let err = s
            .execute::<()>(Method::GET, "/projects", None, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }

    #[tokio::test]
    async fn test_headers_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/projects/p/contexts/t"))
            .and(header("authorization", "Bearer tok"))
            .and(header("user-agent", "stompy-cli/1.2.3"))
            .and(header("content-type", "application/json"))
            .and(query_param("force", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let mut s = session(&server, Some("tok"), "1.2.3");
        s.execute(
            Method::PUT,
            "/projects/p/contexts/t",
            Some(&serde_json::json!({"content": "x"})),
            &[("force", "true".to_string())],
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_no_auth_header_without_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;

        let mut s = session(&server, Some(""), "dev");
        s.execute::<()>(Method::GET, "/health", None, &[]).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].headers.get("authorization").is_none());
        assert_eq!(
            requests[0].headers.get("user-agent").unwrap().to_str().unwrap(),
            "stompy-cli/dev"
        );
    }

    #[tokio::test]
    async fn test_no_cache_applies_to_first_attempt_only() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .with_priority(2)
            .mount(&server)
            .await;

        let mut s = session(&server, None, "1.0.0");
        s.set_no_cache();
        s.execute::<()>(Method::GET, "/contexts", None, &[]).await.unwrap();
        assert!(!s.no_cache_pending());
        s.execute::<()>(Method::GET, "/contexts", None, &[]).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 3);
        let no_cache: Vec<bool> = requests
            .iter()
            .map(|r| r.headers.get("cache-control").is_some())
            .collect();
        assert_eq!(no_cache, vec![true, false, false]);
    }

    #[tokio::test]
    async fn test_compat_warning_fires_once_and_api_version_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header(API_VERSION_HEADER, "2.4.0")
                    .insert_header(MIN_CLI_VERSION_HEADER, "0.2.0")
                    .set_body_string("{}"),
            )
            .mount(&server)
            .await;

        let mut s = session(&server, None, "0.1.4");
        assert!(!s.compat_warned());
        assert_eq!(s.api_version(), None);

        s.execute::<()>(Method::GET, "/health", None, &[]).await.unwrap();
        assert!(s.compat_warned());
        assert_eq!(s.api_version(), Some("2.4.0"));

        s.execute::<()>(Method::GET, "/health", None, &[]).await.unwrap();
        assert!(s.compat_warned());
    }

    #[tokio::test]
    async fn test_up_to_date_client_never_warns() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header(MIN_CLI_VERSION_HEADER, "0.2.0")
                    .set_body_string("{}"),
            )
            .mount(&server)
            .await;

        let mut s = session(&server, None, "0.2.0");
        s.execute::<()>(Method::GET, "/health", None, &[]).await.unwrap();
        assert!(!s.compat_warned());
    }

    #[tokio::test]
    async fn test_delete_with_result_handles_no_content() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/a"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/b"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"ok"}"#))
            .mount(&server)
            .await;

        let mut s = session(&server, None, "1.0.0");
        let none: Option<serde_json::Value> = s.delete_with_result("/a", &[]).await.unwrap();
        assert_eq!(none, None);
        let some: Option<serde_json::Value> = s.delete_with_result("/b", &[]).await.unwrap();
        assert_eq!(some, Some(serde_json::json!({"status": "ok"})));
    }

    #[tokio::test]
    async fn test_decode_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let mut s = session(&server, None, "1.0.0");
        let err = s.get::<serde_json::Value>("/x", &[]).await.unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let s = Session::new("https://api.stompy.ai/api/v1//", None, "1.0.0").unwrap();
        assert_eq!(s.base_url(), "https://api.stompy.ai/api/v1");
    }

    #[test]
    fn test_preview_truncates() {
        let long = "x".repeat(300);
        let p = preview(long.as_bytes());
        assert_eq!(p.len(), BODY_PREVIEW_CHARS + 3);
        assert!(p.ends_with("..."));
        assert_eq!(preview(b"short"), "short");
    }

    #[test]
    fn test_segment_escapes_reserved_characters() {
        assert_eq!(segment("my topic/v2"), "my%20topic%2Fv2");
    }
}
