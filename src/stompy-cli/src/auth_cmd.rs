//! `login`, `logout` and `whoami`.

use anyhow::{Context, Result};
use chrono::{Local, SecondsFormat, Utc};
use clap::Parser;
use stompy_common::{DEFAULT_TIMEOUT, create_client, user_agent_for};
use stompy_login::{LoginFlow, TokenRecord, TokenStore, is_expired};

use crate::VERSION;
use crate::app::AppContext;

/// Browser-based login.
#[derive(Debug, Parser)]
pub struct LoginCli {}

impl LoginCli {
    pub async fn run(self, app: &mut AppContext) -> Result<()> {
        let http = create_client(&user_agent_for(VERSION), DEFAULT_TIMEOUT)
            .map_err(anyhow::Error::msg)?;
        let tokens = LoginFlow::new(app.api_url(), http)
            .run()
            .await
            .context("login failed")?;

        let record = TokenRecord::from_response(&tokens, Utc::now(), None);
        app.config.save_token(&record).context("saving tokens")?;

        println!(
            "Login successful! Token saved to {}",
            app.config.config_path().display()
        );
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct LogoutCli {}

impl LogoutCli {
    pub async fn run(self, app: &mut AppContext) -> Result<()> {
        app.config.clear_tokens().context("clearing tokens")?;
        println!("Logged out. Tokens cleared.");
        Ok(())
    }
}

#[derive(Debug, Parser)]
pub struct WhoamiCli {}

impl WhoamiCli {
    pub async fn run(self, app: &mut AppContext) -> Result<()> {
        match whoami_fields(app) {
            Some(fields) => print!("{}", app.output().format_single(&fields)),
            None => println!("Not authenticated. Run 'stompy login' to authenticate."),
        }
        Ok(())
    }
}

/// Fields describing the active credential, or `None` when there is none.
///
/// An API key (flag or config) takes precedence over stored OAuth tokens.
fn whoami_fields(app: &AppContext) -> Option<Vec<(&'static str, String)>> {
    let has_key = app.flags.api_key.as_deref().is_some_and(|k| !k.is_empty())
        || app.config.api_key().is_some();
    if has_key {
        return Some(vec![
            ("Auth Method", "API Key".to_string()),
            ("Status", "Authenticated".to_string()),
        ]);
    }

    let stored = app.config.load_token();
    stored.access_token.as_deref().filter(|t| !t.is_empty())?;

    let status = match stored.expiry {
        Some(expiry) if !is_expired(expiry) => "Valid",
        _ => "Expired (will auto-refresh on next command)",
    };

    let mut fields = vec![
        ("Auth Method", "OAuth 2.0 (PKCE)".to_string()),
        ("Status", status.to_string()),
    ];
    if let Some(email) = stored.email.filter(|e| !e.is_empty()) {
        fields.push(("Email", email));
    }
    if let Some(expiry) = stored.expiry {
        fields.push((
            "Token Expiry",
            expiry
                .with_timezone(&Local)
                .to_rfc3339_opts(SecondsFormat::Secs, false),
        ));
    }
    Some(fields)
}
