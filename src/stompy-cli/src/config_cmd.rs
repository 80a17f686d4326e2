//! `config set|get|show`.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::AppContext;

/// Manage CLI configuration.
#[derive(Debug, Parser)]
pub struct ConfigCli {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Set a config value
    Set { key: String, value: String },

    /// Get a config value
    Get { key: String },

    /// Show all configuration
    Show,
}

impl ConfigCli {
    pub async fn run(self, app: &mut AppContext) -> Result<()> {
        match self.action {
            ConfigAction::Set { key, value } => {
                app.config.set_value(&key, &value)?;
                println!("{key} = {value}");
            }
            ConfigAction::Get { key } => match app.config.get_value(&key) {
                Some(value) => println!("{value}"),
                None => println!("{key} is not set"),
            },
            ConfigAction::Show => {
                let settings = app.config.settings();
                let fields: Vec<(&str, String)> = settings
                    .iter()
                    .map(|(k, v)| (k.as_str(), mask_value(k, v)))
                    .collect();
                print!("{}", app.output().format_single(&fields));
                println!("\nConfig file: {}", app.config.config_path().display());
            }
        }
        Ok(())
    }
}

fn is_sensitive(key: &str) -> bool {
    let lower = key.to_lowercase();
    lower.contains("key") || lower.contains("token") || lower.contains("secret")
}

/// Shorten secrets longer than 12 characters to `first8...last4`.
pub fn mask_value(key: &str, value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if !is_sensitive(key) || chars.len() <= 12 {
        return value.to_string();
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
