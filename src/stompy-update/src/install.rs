//! Swapping the running executable for a new build.
//!
//! The swap goes through three sibling paths:
//! - `<exe>.new` holds the new binary before it is moved into place
//! - `<exe>.old` holds the previous binary while the swap is in flight
//! - `<exe>` itself, which must exist whenever [`replace_executable`] returns
//!   anything other than [`UpdateError::RollbackFailed`]
//!
//! If the new binary cannot be moved in and the previous one cannot be moved
//! back, both siblings stay on disk and the error names them.

use std::path::{Path, PathBuf};

use crate::error::{UpdateError, UpdateResult};

/// Filesystem operations used by the swap. Swapped out in tests to
/// simulate failures at each step.
pub trait ReplaceFs: Send + Sync {
    /// Write `data` to `path` as an executable file.
    fn write_executable(&self, path: &Path, data: &[u8]) -> std::io::Result<()>;
    fn rename(&self, from: &Path, to: &Path) -> std::io::Result<()>;
    fn remove_file(&self, path: &Path) -> std::io::Result<()>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFs;

impl ReplaceFs for StdFs {
    fn write_executable(&self, path: &Path, data: &[u8]) -> std::io::Result<()> {
        #[cfg(unix)]
        {
            use std::io::Write;
            use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
            let mut file = std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o755)
                .open(path)?;
            file.write_all(data)?;
            file.sync_all()?;
            // An existing file keeps its old mode through open()
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        }

        #[cfg(not(unix))]
        {
            std::fs::write(path, data)
        }
    }

    fn rename(&self, from: &Path, to: &Path) -> std::io::Result<()> {
        std::fs::rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> std::io::Result<()> {
        std::fs::remove_file(path)
    }
}

/// Real path of the running executable, with symlinks resolved.
pub fn current_executable() -> UpdateResult<PathBuf> {
    let exe = std::env::current_exe().map_err(UpdateError::ExecutablePath)?;
    std::fs::canonicalize(&exe).map_err(UpdateError::ExecutablePath)
}

fn sibling(exe: &Path, suffix: &str) -> PathBuf {
    let mut name = exe.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Replace `exe` with `data`, restoring the previous binary if the final
/// rename fails.
pub fn replace_executable(fs: &dyn ReplaceFs, exe: &Path, data: &[u8]) -> UpdateResult<()> {
    let new_path = sibling(exe, ".new");
    let old_path = sibling(exe, ".old");

    if let Err(e) = fs.write_executable(&new_path, data) {
        let _ = fs.remove_file(&new_path);
        return Err(UpdateError::WriteFailed(e));
    }

    // A backup left by an interrupted run would block the rename on Windows
    let _ = fs.remove_file(&old_path);

    if let Err(e) = fs.rename(exe, &old_path) {
        let _ = fs.remove_file(&new_path);
        return Err(UpdateError::BackupFailed(e));
    }

    if let Err(e) = fs.rename(&new_path, exe) {
        if let Err(restore) = fs.rename(&old_path, exe) {
            tracing::error!(
                error = %restore,
                backup = %old_path.display(),
                staged = %new_path.display(),
                "Failed to restore previous binary"
            );
            return Err(UpdateError::RollbackFailed {
                source: e,
                backup: old_path,
                staged: new_path,
            });
        }
        let _ = fs.remove_file(&new_path);
        return Err(UpdateError::ReplaceFailed(e));
    }

    if let Err(e) = fs.remove_file(&old_path) {
        tracing::debug!(error = %e, "Could not remove backup binary");
    }
    Ok(())
}
