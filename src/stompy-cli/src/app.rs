//! Per-invocation state shared by the commands.

use anyhow::{Context, Result, bail};
use stompy_client::Session;
use stompy_common::{Config, DEFAULT_TIMEOUT, create_client, user_agent_for};

use crate::VERSION;
use crate::cli::GlobalArgs;
use crate::output::OutputFormat;

/// Environment variable holding an API key.
pub const API_KEY_ENV_VAR: &str = "STOMPY_API_KEY";

/// Loaded config plus the global flags of this run.
pub struct AppContext {
    pub config: Config,
    pub flags: GlobalArgs,
    token: Option<String>,
}

impl AppContext {
    pub fn load(flags: GlobalArgs) -> Result<Self> {
        let config = Config::load().context("loading config")?;
        Ok(Self::new(config, flags))
    }

    pub fn new(config: Config, flags: GlobalArgs) -> Self {
        Self {
            config,
            flags,
            token: None,
        }
    }

    /// `--api-url`, else the configured (or default) URL.
    pub fn api_url(&self) -> String {
        self.flags
            .api_url
            .clone()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| self.config.api_url())
    }

    /// `--output`, else the configured format.
    pub fn output(&self) -> OutputFormat {
        self.flags
            .output
            .unwrap_or_else(|| OutputFormat::from_str_loose(&self.config.output_format()))
    }

    /// Active project from `-p`, `STOMPY_PROJECT` or `default_project`.
    pub fn project(&self) -> Result<String> {
        Ok(self.config.resolve_project(self.flags.project.as_deref())?)
    }

    /// Pick the credential for API calls, once per run.
    ///
    /// `--api-key`, then `STOMPY_API_KEY`, then the stored OAuth token
    /// (refreshed when stale), then the configured `api_key`. A stored token
    /// that cannot be refreshed falls through to the configured key.
    pub async fn resolve_auth_token(&mut self) -> Result<String> {
        if let Some(token) = &self.token {
            return Ok(token.clone());
        }
        let token = self.find_auth_token().await?;
        self.token = Some(token.clone());
        Ok(token)
    }

    async fn find_auth_token(&mut self) -> Result<String> {
        if let Some(key) = self.flags.api_key.clone().filter(|k| !k.is_empty()) {
            return Ok(key);
        }

        if let Ok(key) = std::env::var(API_KEY_ENV_VAR)
            && !key.is_empty()
        {
            return Ok(key);
        }

        if self.config.access_token().is_some_and(|t| !t.is_empty()) {
            let http = create_client(&user_agent_for(VERSION), DEFAULT_TIMEOUT)
                .map_err(anyhow::Error::msg)?;
            let api_url = self.api_url();
            match stompy_login::get_valid_token(&http, &mut self.config, &api_url).await {
                Ok(token) => return Ok(token),
                Err(e) => {
                    tracing::debug!(error = %e, "Stored OAuth token unusable, falling back to API key");
                }
            }
        }

        if let Some(key) = self.config.api_key() {
            return Ok(key);
        }

        bail!("not authenticated. Run 'stompy login' or set {API_KEY_ENV_VAR}")
    }

    /// An authenticated API session for this run.
    pub async fn session(&mut self) -> Result<Session> {
        let token = self.resolve_auth_token().await?;
        Ok(Session::new(&self.api_url(), Some(token), VERSION)?)
    }

    /// Session plus the active project, for project-scoped commands.
    pub async fn project_session(&mut self) -> Result<(Session, String)> {
        let project = self.project()?;
        let session = self.session().await?;
        Ok((session, project))
    }
}
