//! Non-blocking release check run alongside a command.
//!
//! The check runs on its own task while the command executes. Its answer is
//! looked at exactly once, after the command returns; a check still in
//! flight at that point is abandoned.

use std::path::PathBuf;

use stompy_update::UpdateManager;
use tokio::sync::oneshot;

use crate::styled_output::{MessageType, styled_label};

/// Handle on a spawned release check.
pub struct BackgroundCheck {
    rx: oneshot::Receiver<Option<String>>,
}

impl BackgroundCheck {
    /// Spawn the check for `current` with its cache under `config_dir`.
    pub fn spawn(config_dir: PathBuf, current: &str) -> Self {
        let manager = UpdateManager::new(config_dir, current);
        Self::spawn_with(manager, current)
    }

    pub fn spawn_with(manager: UpdateManager, current: &str) -> Self {
        let (tx, rx) = oneshot::channel();
        let current = current.to_string();
        tokio::spawn(async move {
            let latest = manager.check_for_update(&current).await;
            let _ = tx.send(latest);
        });
        Self { rx }
    }

    /// The newer version, if the check already finished and found one.
    pub fn try_take(mut self) -> Option<String> {
        self.rx.try_recv().ok().flatten().filter(|v| !v.is_empty())
    }
}

/// The notice printed after a command when a newer release exists.
pub fn update_notice(latest: &str) -> String {
    format!(
        "\n{} A new version of stompy is available ({}). Run {} to upgrade.",
        styled_label(MessageType::Dim, "→", true),
        styled_label(MessageType::Accent, latest, true),
        styled_label(MessageType::Accent, "stompy update", true),
    )
}
