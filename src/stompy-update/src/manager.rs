//! Update manager - main API for update operations.

use std::path::{Path, PathBuf};

use stompy_common::{RELEASE_TIMEOUT, UPDATE_CHECK_TIMEOUT, user_agent_for};

use crate::api::{ReleaseClient, ReleaseInfo, find_asset, platform_tokens};
use crate::download::{DownloadProgress, download_asset};
use crate::error::{UpdateError, UpdateResult};
use crate::extract::extract_binary;
use crate::install::{ReplaceFs, StdFs, current_executable, replace_executable};
use crate::version::{VersionCache, is_same_version};

/// Progress events emitted by [`UpdateManager::self_update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateProgress {
    /// An asset was selected and its download is starting
    Downloading { version: String, size: u64 },
    /// A chunk arrived
    Downloaded(DownloadProgress),
}

/// A completed self-update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub from: String,
    pub to: String,
}

/// Manager for update operations.
pub struct UpdateManager {
    client: ReleaseClient,
    config_dir: PathBuf,
    fs: Box<dyn ReplaceFs>,
}

impl UpdateManager {
    /// Create a manager caching checks under `config_dir`.
    pub fn new(config_dir: impl Into<PathBuf>, version: &str) -> Self {
        Self {
            client: ReleaseClient::new(user_agent_for(version)),
            config_dir: config_dir.into(),
            fs: Box::new(StdFs),
        }
    }

    /// Use a different release index client.
    pub fn with_client(mut self, client: ReleaseClient) -> Self {
        self.client = client;
        self
    }

    /// Use a different filesystem for the executable swap.
    pub fn with_fs(mut self, fs: impl ReplaceFs + 'static) -> Self {
        self.fs = Box::new(fs);
        self
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Best-effort check for a newer release.
    ///
    /// Answers from the cache while it is fresh. Every failure reads as
    /// "no update"; the error is only logged.
    pub async fn check_for_update(&self, current: &str) -> Option<String> {
        if current.is_empty() || current == "dev" {
            return None;
        }

        if let Some(cache) = VersionCache::load(&self.config_dir)
            && cache.is_fresh()
        {
            tracing::debug!(latest = %cache.latest_version, "Using cached release check");
            return cache.newer_than(current);
        }

        let release = match self.client.get_latest(UPDATE_CHECK_TIMEOUT).await {
            Ok(release) => release,
            Err(e) => {
                tracing::debug!(error = %e, "Background update check failed");
                return None;
            }
        };

        let cache = VersionCache::new(&release.tag_name, &release.html_url);
        if let Err(e) = cache.save(&self.config_dir) {
            tracing::debug!(error = %e, "Failed to save version cache");
        }

        cache.newer_than(current)
    }

    /// Fetch the latest release descriptor. Unlike the background check,
    /// failures are reported.
    pub async fn fetch_latest(&self) -> UpdateResult<ReleaseInfo> {
        self.client.get_latest(RELEASE_TIMEOUT).await
    }

    /// Replace the running executable with the latest release.
    pub async fn self_update<F>(&self, current: &str, on_progress: F) -> UpdateResult<UpdateOutcome>
    where
        F: FnMut(UpdateProgress),
    {
        let exe = current_executable()?;
        self.self_update_at(current, &exe, on_progress).await
    }

    /// Full update flow against an explicit executable path:
    /// fetch -> select asset -> download -> extract -> swap.
    pub async fn self_update_at<F>(
        &self,
        current: &str,
        exe: &Path,
        mut on_progress: F,
    ) -> UpdateResult<UpdateOutcome>
    where
        F: FnMut(UpdateProgress),
    {
        let release = self.fetch_latest().await?;

        if is_same_version(current, &release.tag_name) {
            return Err(UpdateError::AlreadyLatest {
                version: current.to_string(),
            });
        }

        let asset = find_asset(&release.assets).ok_or_else(|| {
            let (os, arch) = platform_tokens();
            UpdateError::NoAsset {
                os: os.to_string(),
                arch: arch.to_string(),
            }
        })?;

        on_progress(UpdateProgress::Downloading {
            version: release.tag_name.clone(),
            size: asset.size,
        });
        let archive = download_asset(asset, self.client.user_agent(), |p| {
            on_progress(UpdateProgress::Downloaded(p))
        })
        .await?;

        let binary = extract_binary(&asset.name, &archive, &release.html_url)?;
        replace_executable(self.fs.as_ref(), exe, &binary)?;

        tracing::info!(from = current, to = %release.tag_name, "Executable replaced");
        Ok(UpdateOutcome {
            from: current.to_string(),
            to: release.tag_name,
        })
    }
}
