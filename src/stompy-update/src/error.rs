//! Error types for stompy-update.

use thiserror::Error;

/// Result type for update operations.
pub type UpdateResult<T> = std::result::Result<T, UpdateError>;

/// Errors that can occur during an explicit update.
///
/// The background check never surfaces these; it logs and moves on.
#[derive(Debug, Error)]
pub enum UpdateError {
    // Release index
    #[error("checking GitHub releases: {0}")]
    ReleaseFetch(#[source] reqwest::Error),

    #[error("GitHub API returned {status}")]
    ServerError { status: u16 },

    #[error("parsing release info: {0}")]
    ReleaseParse(#[source] reqwest::Error),

    #[error("already at latest version {version}")]
    AlreadyLatest { version: String },

    #[error("no release binary found for {os}/{arch}")]
    NoAsset { os: String, arch: String },

    // Download
    #[error("downloading release: {0}")]
    DownloadFailed(#[source] reqwest::Error),

    #[error("download failed with status {status}")]
    DownloadStatus { status: u16 },

    // Archive
    #[error("zip extraction not yet supported; download manually from {html_url}")]
    ZipUnsupported { html_url: String },

    #[error("unknown archive format: {name}")]
    UnknownArchive { name: String },

    #[error("extracting binary: {0}")]
    ExtractionFailed(#[source] std::io::Error),

    #[error("stompy binary not found in archive")]
    BinaryNotFound,

    // Replacement
    #[error("finding executable path: {0}")]
    ExecutablePath(#[source] std::io::Error),

    #[error("writing new binary: {0}")]
    WriteFailed(#[source] std::io::Error),

    #[error("backing up old binary: {0}")]
    BackupFailed(#[source] std::io::Error),

    #[error("replacing binary: {0}")]
    ReplaceFailed(#[source] std::io::Error),

    #[error(
        "replacing binary failed and the previous binary could not be restored: {source}; \
         previous binary is at {}, new binary is at {}",
        .backup.display(),
        .staged.display()
    )]
    RollbackFailed {
        #[source]
        source: std::io::Error,
        backup: std::path::PathBuf,
        staged: std::path::PathBuf,
    },

    // Cache
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

impl UpdateError {
    /// Check if this error came from talking to the network.
    pub fn is_network_error(&self) -> bool {
        matches!(
            self,
            Self::ReleaseFetch(_)
                | Self::ServerError { .. }
                | Self::DownloadFailed(_)
                | Self::DownloadStatus { .. }
        )
    }
}
