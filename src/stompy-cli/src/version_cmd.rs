//! `version`: client version, server version and update availability.

use anyhow::Result;
use clap::Parser;
use stompy_client::{Method, Session};
use stompy_update::UpdateManager;

use crate::VERSION;
use crate::app::AppContext;
use crate::styled_output::{MessageType, styled_label};

#[derive(Debug, Parser)]
pub struct VersionCli {}

impl VersionCli {
    pub async fn run(self, app: &mut AppContext) -> Result<()> {
        println!("stompy-cli {VERSION}");

        let api_url = app.api_url();
        if !api_url.is_empty() {
            println!("{}", api_line(&api_url).await);
        }

        let manager = UpdateManager::new(app.config.config_dir(), VERSION);
        if let Some(latest) = manager.check_for_update(VERSION).await {
            println!(
                "{} available: {} (run {} to upgrade)",
                styled_label(MessageType::Dim, "Update", false),
                styled_label(MessageType::Accent, &latest, false),
                styled_label(MessageType::Accent, "stompy update", false),
            );
        }
        Ok(())
    }
}

/// `API: <url>`, with the server version when an unauthenticated
/// `GET /health` reports one.
async fn api_line(api_url: &str) -> String {
    let server_version = match Session::new(api_url, None, VERSION) {
        Ok(mut session) => {
            match session
                .execute::<()>(Method::GET, "/health", None, &[])
                .await
            {
                Ok(_) => session.api_version().map(str::to_string),
                Err(e) => {
                    tracing::debug!(error = %e, "Health check failed");
                    None
                }
            }
        }
        Err(e) => {
            tracing::debug!(error = %e, "Could not build health check session");
            None
        }
    };

    match server_version {
        Some(v) => format!("API: {api_url} (server {v})"),
        None => format!("API: {api_url}"),
    }
}
