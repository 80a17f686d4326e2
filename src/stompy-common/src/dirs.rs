//! Application directory resolution for the stompy CLI.
//!
//! Everything lives under `~/.stompy` on every platform. The whole directory
//! can be relocated with the `STOMPY_HOME` environment variable.

use std::path::{Path, PathBuf};

/// Home directory name under the user's home
pub const HOME_DIR_NAME: &str = ".stompy";

/// Config file name inside the home directory
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Environment variable overriding the home directory
pub const HOME_ENV_VAR: &str = "STOMPY_HOME";

/// Application directories structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDirs {
    /// Configuration directory (~/.stompy)
    pub config_dir: PathBuf,
}

impl AppDirs {
    /// Resolve the application directories, honouring `STOMPY_HOME`.
    ///
    /// Relative override paths are resolved against the current directory so
    /// the config never lands somewhere unexpected.
    pub fn new() -> Option<Self> {
        if let Ok(home) = std::env::var(HOME_ENV_VAR)
            && !home.is_empty()
        {
            let home = PathBuf::from(home);
            let home = if home.is_relative() {
                match std::env::current_dir() {
                    Ok(cwd) => cwd.join(&home),
                    Err(e) => {
                        tracing::warn!(
                            path = %home.display(),
                            error = %e,
                            "STOMPY_HOME is relative but the current directory is unavailable"
                        );
                        dirs::home_dir()?.join(HOME_DIR_NAME)
                    }
                }
            } else {
                home
            };
            return Some(Self { config_dir: home });
        }

        let home_dir = dirs::home_dir()?;
        Some(Self {
            config_dir: home_dir.join(HOME_DIR_NAME),
        })
    }

    /// Directories rooted at an explicit path.
    pub fn at(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Path of the YAML config file.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }

    /// Create the config directory (mode 0700 on Unix) if it is missing.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        ensure_private_dir(&self.config_dir)
    }
}

/// Creates `dir` and restricts it to the current user.
pub fn ensure_private_dir(dir: &Path) -> std::io::Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700))?;
        }
    }
    Ok(())
}

/// Get the stompy home directory (convenience function)
pub fn get_stompy_home() -> Option<PathBuf> {
    AppDirs::new().map(|d| d.config_dir)
}
