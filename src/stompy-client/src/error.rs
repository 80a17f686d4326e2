//! Transport and API errors.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Structured error for a non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub status_code: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Shape of an error body. Unknown fields are ignored.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

impl ApiError {
    /// Build from a response status and body.
    ///
    /// The message comes from the JSON `message` field, else the raw body
    /// text, else the canonical status phrase.
    pub fn from_response(status: StatusCode, body: &[u8]) -> Self {
        let (message, detail) = match serde_json::from_slice::<ErrorBody>(body) {
            Ok(parsed) => (parsed.message.unwrap_or_default(), parsed.detail),
            Err(_) => (String::from_utf8_lossy(body).trim().to_string(), None),
        };

        let message = if message.is_empty() {
            status.canonical_reason().unwrap_or("Unknown Status").to_string()
        } else {
            message
        };

        Self {
            status_code: status.as_u16(),
            message,
            detail: detail.filter(|d| !d.is_empty()),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "API error {}: {}", self.status_code, self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, " - {detail}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Errors returned by [`crate::Session`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Connection refused, timeout and similar transient failures.
    #[error("executing request: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("reading response body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("marshaling request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("decoding response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

impl ClientError {
    /// HTTP status of an API error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Api(e) => Some(e.status_code),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
