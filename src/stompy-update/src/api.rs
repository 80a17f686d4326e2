//! GitHub release index client.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use stompy_common::create_client;

use crate::RELEASE_URL;
use crate::error::{UpdateError, UpdateResult};

/// A downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
    /// File size in bytes
    #[serde(default)]
    pub size: u64,
}

/// Release information from the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    /// Version tag, e.g. `v0.2.0`
    pub tag_name: String,
    /// Human-facing release page
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl ReleaseInfo {
    /// Get the asset for the current platform.
    pub fn asset_for_current_platform(&self) -> Option<&ReleaseAsset> {
        find_asset(&self.assets)
    }
}

/// Client for the release index.
#[derive(Debug, Clone)]
pub struct ReleaseClient {
    release_url: String,
    user_agent: String,
}

impl ReleaseClient {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self::with_url(RELEASE_URL, user_agent)
    }

    /// Point at another index, e.g. a mock server.
    pub fn with_url(release_url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            release_url: release_url.into(),
            user_agent: user_agent.into(),
        }
    }

    pub fn release_url(&self) -> &str {
        &self.release_url
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Fetch the latest release, bounded by `timeout`.
    pub async fn get_latest(&self, timeout: Duration) -> UpdateResult<ReleaseInfo> {
        let client = create_client(&self.user_agent, timeout).map_err(UpdateError::HttpClient)?;

        let response = client
            .get(&self.release_url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(UpdateError::ReleaseFetch)?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpdateError::ServerError {
                status: status.as_u16(),
            });
        }

        response
            .json::<ReleaseInfo>()
            .await
            .map_err(UpdateError::ReleaseParse)
    }
}

/// OS and architecture tokens as they appear in release asset names.
///
/// Archives are named `stompy_<version>_<os>_<arch>`, with `darwin` for
/// macOS and `amd64`/`arm64`/`386` for the architectures.
pub fn platform_tokens() -> (&'static str, &'static str) {
    let os = if cfg!(target_os = "linux") {
        "linux"
    } else if cfg!(target_os = "macos") {
        "darwin"
    } else if cfg!(target_os = "windows") {
        "windows"
    } else {
        std::env::consts::OS
    };

    let arch = if cfg!(target_arch = "x86_64") {
        "amd64"
    } else if cfg!(target_arch = "aarch64") {
        "arm64"
    } else if cfg!(target_arch = "x86") {
        "386"
    } else {
        std::env::consts::ARCH
    };

    (os, arch)
}

/// Archive extension published for an OS token.
fn archive_extension(os: &str) -> &'static str {
    if os == "windows" { ".zip" } else { ".tar.gz" }
}

/// Pick the asset for the running platform.
pub fn find_asset(assets: &[ReleaseAsset]) -> Option<&ReleaseAsset> {
    let (os, arch) = platform_tokens();
    find_asset_for(assets, os, arch)
}

pub(crate) fn find_asset_for<'a>(
    assets: &'a [ReleaseAsset],
    os: &str,
    arch: &str,
) -> Option<&'a ReleaseAsset> {
    let ext = archive_extension(os);
    assets.iter().find(|asset| {
        let name = asset.name.to_lowercase();
        name.contains(os) && name.contains(arch) && name.ends_with(ext)
    })
}
