//! stompy CLI library module.
//!
//! - `cli/` - argument parsing and command dispatch
//! - `app` - per-invocation state: config, global flags, auth resolution
//! - `output` - table/JSON/YAML rendering
//! - `styled_output` - themed status messages on stderr
//! - `update_check` - background release check
//! - `*_cmd.rs` - individual commands

pub mod app;
pub mod auth_cmd;
pub mod cli;
pub mod config_cmd;
pub mod context_cmd;
pub mod output;
pub mod project_cmd;
pub mod styled_output;
pub mod ticket_cmd;
pub mod update_check;
pub mod update_cmd;
pub mod version_cmd;

/// Version baked in at build time (`STOMPY_VERSION`), else the crate version.
pub const VERSION: &str = match option_env!("STOMPY_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};
