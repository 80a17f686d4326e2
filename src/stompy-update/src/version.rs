//! Version-check cache and tag comparison.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::UpdateResult;
use crate::{CACHE_FILE_NAME, CHECK_INTERVAL_HOURS};

/// Result of the last release check, stored as JSON in the config directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionCache {
    /// When the check was performed
    pub last_check: DateTime<Utc>,
    /// Latest tag seen
    #[serde(default)]
    pub latest_version: String,
    #[serde(default)]
    pub release_url: String,
}

impl VersionCache {
    pub fn new(latest_version: impl Into<String>, release_url: impl Into<String>) -> Self {
        Self {
            last_check: Utc::now(),
            latest_version: latest_version.into(),
            release_url: release_url.into(),
        }
    }

    /// Get the path to the cache file.
    pub fn cache_path(config_dir: &Path) -> PathBuf {
        config_dir.join(CACHE_FILE_NAME)
    }

    /// Load the cache from disk. Missing or corrupt files read as no cache.
    pub fn load(config_dir: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(Self::cache_path(config_dir)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Save the cache to disk.
    pub fn save(&self, config_dir: &Path) -> UpdateResult<()> {
        stompy_common::dirs::ensure_private_dir(config_dir)?;
        let content = serde_json::to_string(self)?;
        std::fs::write(Self::cache_path(config_dir), content)?;
        Ok(())
    }

    /// Check if the cache is younger than the check interval.
    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Utc::now())
    }

    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now - self.last_check < TimeDelta::hours(CHECK_INTERVAL_HOURS)
    }

    /// The cached tag when it names a different version than `current`.
    pub fn newer_than(&self, current: &str) -> Option<String> {
        if self.latest_version.is_empty() || is_same_version(current, &self.latest_version) {
            None
        } else {
            Some(self.latest_version.clone())
        }
    }
}

/// True when `tag` names `current`, with or without a leading `v`.
pub fn is_same_version(current: &str, tag: &str) -> bool {
    let strip = |v: &str| v.strip_prefix('v').unwrap_or(v).to_string();
    strip(current) == strip(tag)
}
