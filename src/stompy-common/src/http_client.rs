//! Centralized HTTP client factory for the stompy CLI.
//!
//! Every component builds its `reqwest::Client` here so the user agent and
//! socket options stay consistent:
//! - `create_client(user_agent, timeout)` - client with a fixed overall timeout
//! - `create_client_builder(user_agent)` - builder for further customisation

use reqwest::Client;
use std::time::Duration;

/// Product prefix of the User-Agent header
pub const USER_AGENT_PREFIX: &str = "stompy-cli";

/// Timeout for API requests (30 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for the background release check (3 seconds)
pub const UPDATE_CHECK_TIMEOUT: Duration = Duration::from_secs(3);

/// Timeout for an explicit release lookup (10 seconds)
pub const RELEASE_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for downloading a release archive (2 minutes)
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Idle pooled connections are dropped after this long.
pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Builds the `stompy-cli/<version>` user agent.
///
/// An empty or `dev` version yields `stompy-cli/dev`.
pub fn user_agent_for(version: &str) -> String {
    if version.is_empty() || version == "dev" {
        format!("{USER_AGENT_PREFIX}/dev")
    } else {
        format!("{USER_AGENT_PREFIX}/{version}")
    }
}

/// Creates an HTTP client with a custom timeout.
///
/// All clients include:
/// - the given User-Agent
/// - tcp_nodelay: true
/// - pool_idle_timeout: 60s
pub fn create_client(user_agent: &str, timeout: Duration) -> Result<Client, String> {
    create_client_builder(user_agent)
        .timeout(timeout)
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {e}"))
}

/// Creates an HTTP client builder with standard configuration.
///
/// The builder carries [`DEFAULT_TIMEOUT`]; callers may override it.
pub fn create_client_builder(user_agent: &str) -> reqwest::ClientBuilder {
    Client::builder()
        .user_agent(user_agent)
        .timeout(DEFAULT_TIMEOUT)
        .tcp_nodelay(true)
        .pool_idle_timeout(POOL_IDLE_TIMEOUT)
        .pool_max_idle_per_host(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_for_release() {
        assert_eq!(user_agent_for("0.3.1"), "stompy-cli/0.3.1");
    }

    #[test]
    fn test_user_agent_for_dev_and_empty() {
        assert_eq!(user_agent_for("dev"), "stompy-cli/dev");
        assert_eq!(user_agent_for(""), "stompy-cli/dev");
    }

    #[test]
    fn test_create_client_succeeds() {
        let result = create_client(&user_agent_for("1.0.0"), Duration::from_secs(5));
        assert!(result.is_ok(), "create_client should succeed");
    }

    #[test]
    fn test_create_client_builder_returns_builder() {
        let result = create_client_builder("stompy-cli/dev").build();
        assert!(
            result.is_ok(),
            "create_client_builder should return valid builder"
        );
    }

    #[test]
    fn test_timeout_constants_are_correct() {
        assert_eq!(DEFAULT_TIMEOUT, Duration::from_secs(30));
        assert_eq!(UPDATE_CHECK_TIMEOUT, Duration::from_secs(3));
        assert_eq!(RELEASE_TIMEOUT, Duration::from_secs(10));
        assert_eq!(DOWNLOAD_TIMEOUT, Duration::from_secs(120));
    }
}
