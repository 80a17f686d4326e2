//! Download functionality with progress tracking.

use futures::StreamExt;
use stompy_common::{DOWNLOAD_TIMEOUT, create_client};

use crate::api::ReleaseAsset;
use crate::error::{UpdateError, UpdateResult};

/// Upper bound on the buffer reserved up front from the advertised size.
const MAX_PREALLOC: u64 = 64 * 1024 * 1024;

/// Progress information during download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    /// Bytes downloaded so far
    pub downloaded: u64,
    /// Total bytes to download, as advertised by the release index
    pub total: u64,
}

impl DownloadProgress {
    /// Get download progress as a percentage (0-100).
    pub fn percentage(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        (self.downloaded as f32 / self.total as f32) * 100.0
    }

    pub fn downloaded_human(&self) -> String {
        format_size(self.downloaded)
    }

    pub fn total_human(&self) -> String {
        format_size(self.total)
    }
}

/// Format bytes as human-readable string (1024-based, one decimal).
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Download an asset into memory, reporting progress per chunk.
pub(crate) async fn download_asset<F>(
    asset: &ReleaseAsset,
    user_agent: &str,
    mut on_progress: F,
) -> UpdateResult<Vec<u8>>
where
    F: FnMut(DownloadProgress),
{
    let client = create_client(user_agent, DOWNLOAD_TIMEOUT).map_err(UpdateError::HttpClient)?;

    let response = client
        .get(&asset.browser_download_url)
        .send()
        .await
        .map_err(UpdateError::DownloadFailed)?;

    let status = response.status();
    if !status.is_success() {
        return Err(UpdateError::DownloadStatus {
            status: status.as_u16(),
        });
    }

    let total = asset.size;
    let mut body = Vec::with_capacity(prealloc_hint(total));
    let mut stream = response.bytes_stream();

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(UpdateError::DownloadFailed)?;
        body.extend_from_slice(&chunk);
        on_progress(DownloadProgress {
            downloaded: body.len() as u64,
            total,
        });
    }

    tracing::debug!(bytes = body.len(), url = %asset.browser_download_url, "Release archive downloaded");
    Ok(body)
}

/// The advertised size comes from release metadata and is only a hint.
fn prealloc_hint(advertised: u64) -> usize {
    usize::try_from(advertised.min(MAX_PREALLOC)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5242880), "5.0 MB");
        assert_eq!(format_size(1073741824), "1.0 GB");
    }

    #[test]
    fn test_download_progress() {
        let progress = DownloadProgress {
            downloaded: 50_000_000,
            total: 100_000_000,
        };
        assert!((progress.percentage() - 50.0).abs() < 0.01);
        assert_eq!(progress.downloaded_human(), "47.7 MB");
        assert_eq!(progress.total_human(), "95.4 MB");
        assert_eq!(DownloadProgress { downloaded: 5, total: 0 }.percentage(), 0.0);
    }

    #[tokio::test]
    async fn test_download_reports_progress() {
        let server = MockServer::start().await;
        let payload = vec![7u8; 4096];
        Mock::given(method("GET"))
            .and(path("/asset.tar.gz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
            .mount(&server)
            .await;

        let asset = ReleaseAsset {
            name: "asset.tar.gz".into(),
            browser_download_url: format!("{}/asset.tar.gz", server.uri()),
            size: 4096,
        };
        let mut last = None;
        let body = download_asset(&asset, "stompy-cli/test", |p| last = Some(p))
            .await
            .unwrap();
        assert_eq!(body, payload);
        assert_eq!(
            last,
            Some(DownloadProgress {
                downloaded: 4096,
                total: 4096
            })
        );
    }

    #[test]
    fn test_prealloc_hint_is_capped() {
        assert_eq!(prealloc_hint(0), 0);
        assert_eq!(prealloc_hint(4096), 4096);
        assert_eq!(prealloc_hint(u64::MAX), MAX_PREALLOC as usize);
    }

    #[tokio::test]
    async fn test_download_with_inflated_advertised_size() {
        let server = MockServer::start().await;
        let payload = b"small archive".to_vec();
        Mock::given(method("GET"))
            .and(path("/asset.tar.gz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
            .mount(&server)
            .await;

        let asset = ReleaseAsset {
            name: "asset.tar.gz".into(),
            browser_download_url: format!("{}/asset.tar.gz", server.uri()),
            size: u64::MAX / 2,
        };
        let mut last = None;
        let body = download_asset(&asset, "stompy-cli/test", |p| last = Some(p))
            .await
            .unwrap();
        assert_eq!(body, payload);
        assert_eq!(last.map(|p| p.total), Some(u64::MAX / 2));
        assert!(body.capacity() <= MAX_PREALLOC as usize);
    }

    #[tokio::test]
    async fn test_download_rejects_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let asset = ReleaseAsset {
            name: "missing.tar.gz".into(),
            browser_download_url: format!("{}/missing.tar.gz", server.uri()),
            size: 0,
        };
        let err = download_asset(&asset, "stompy-cli/test", |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, UpdateError::DownloadStatus { status: 404 }));
    }
}
