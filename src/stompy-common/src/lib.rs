//! Common plumbing shared across the stompy CLI crates.

pub mod config;
pub mod dirs;
pub mod http_client;

pub use config::{
    AuthSection, Config, ConfigError, ConfigResult, DEFAULT_API_URL, DEFAULT_OUTPUT_FORMAT,
};
pub use dirs::{AppDirs, get_stompy_home};
pub use http_client::{
    DEFAULT_TIMEOUT, DOWNLOAD_TIMEOUT, RELEASE_TIMEOUT, UPDATE_CHECK_TIMEOUT, create_client,
    create_client_builder, user_agent_for,
};
