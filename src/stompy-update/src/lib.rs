//! Stompy Update - release check and self-update for the stompy CLI
//!
//! Provides:
//! - A best-effort, cached check against the GitHub release index
//! - Download and extraction of the platform archive
//! - Replacement of the running executable with rollback on failure
//!
//! # Example
//!
//! ```rust,ignore
//! use stompy_update::UpdateManager;
//!
//! let manager = UpdateManager::new(config_dir);
//!
//! if let Some(tag) = manager.check_for_update("0.1.0").await {
//!     println!("Update available: {tag}");
//! }
//!
//! let outcome = manager.self_update("0.1.0", |_| {}).await?;
//! ```

mod api;
mod download;
mod error;
mod extract;
mod install;
mod manager;
mod version;

pub use api::{ReleaseAsset, ReleaseClient, ReleaseInfo, find_asset, platform_tokens};
pub use download::{DownloadProgress, format_size};
pub use error::{UpdateError, UpdateResult};
pub use install::{ReplaceFs, StdFs, current_executable, replace_executable};
pub use manager::{UpdateManager, UpdateOutcome, UpdateProgress};
pub use version::{VersionCache, is_same_version};

/// GitHub repository publishing stompy releases
pub const GITHUB_REPO: &str = "banton/stompy-cli";

/// Latest-release endpoint of the release index
pub const RELEASE_URL: &str = "https://api.github.com/repos/banton/stompy-cli/releases/latest";

/// Name of the version-check cache file inside the config directory
pub const CACHE_FILE_NAME: &str = ".version-check";

/// How long a cached check is trusted (24 hours)
pub const CHECK_INTERVAL_HOURS: i64 = 24;

/// Executable names looked for inside a release archive
pub const BINARY_NAMES: &[&str] = &["stompy", "stompy.exe"];
