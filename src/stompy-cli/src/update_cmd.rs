//! `update`: replace the running binary with the latest release.

use std::io::Write;

use anyhow::Result;
use clap::Parser;
use stompy_update::{UpdateManager, UpdateProgress, format_size};

use crate::VERSION;
use crate::app::AppContext;
use crate::styled_output::println_success;

#[derive(Debug, Parser)]
pub struct UpdateCli {}

impl UpdateCli {
    pub async fn run(self, app: &mut AppContext) -> Result<()> {
        println!("Current version: {VERSION}");

        let manager = UpdateManager::new(app.config.config_dir(), VERSION);
        let mut last_percent = None;
        let outcome = manager
            .self_update(VERSION, |progress| match progress {
                UpdateProgress::Downloading { version, size } => {
                    println!("Downloading {version} ({})...", format_size(size));
                }
                UpdateProgress::Downloaded(p) => {
                    let percent = p.percentage().round() as u8;
                    if last_percent != Some(percent) {
                        last_percent = Some(percent);
                        print!(
                            "\r  {} / {} ({percent}%)",
                            p.downloaded_human(),
                            p.total_human()
                        );
                        let _ = std::io::stdout().flush();
                    }
                }
            })
            .await;

        if last_percent.is_some() {
            println!();
        }
        let outcome = outcome?;

        println!("Updated stompy {} -> {}", outcome.from, outcome.to);
        println_success("stompy has been updated.");
        Ok(())
    }
}
