//! CLI argument structures and parsing.

use clap::{Args, Parser, Subcommand};

use super::styles::{AFTER_HELP, get_styles};
use crate::VERSION;
use crate::auth_cmd::{LoginCli, LogoutCli, WhoamiCli};
use crate::config_cmd::ConfigCli;
use crate::context_cmd::ContextCli;
use crate::output::OutputFormat;
use crate::project_cmd::ProjectCli;
use crate::ticket_cmd::TicketCli;
use crate::update_cmd::UpdateCli;
use crate::version_cmd::VersionCli;

/// Log verbosity level for CLI output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Only show errors
    Error,
    /// Show warnings and errors (default)
    #[default]
    Warn,
    /// Show informational messages, warnings, and errors
    Info,
    /// Show debug messages and above, including HTTP traffic
    Debug,
    /// Show all messages including trace-level details
    Trace,
}

impl LogLevel {
    /// Convert to tracing filter string.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn from_str_loose(s: &str) -> Option<LogLevel> {
        match s.to_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

/// Color output mode for CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ColorMode {
    /// Automatically detect if output is a terminal
    #[default]
    Auto,
    /// Always output with colors
    Always,
    /// Never output with colors
    Never,
}

/// stompy - manage projects, contexts, and tickets
#[derive(Parser)]
#[command(name = "stompy", version = VERSION)]
#[command(
    about = "stompy - manage projects, contexts, and tickets",
    long_about = "A command-line interface for the Stompy API. Manage projects, contexts, and tickets from your terminal."
)]
#[command(styles = get_styles(), after_help = AFTER_HELP, arg_required_else_help = true)]
pub struct Cli {
    #[clap(flatten)]
    pub global: GlobalArgs,

    /// Enable verbose output (same as --log-level debug)
    #[arg(long = "verbose", short = 'v', global = true)]
    pub verbose: bool,

    /// Enable trace-level logging for debugging
    #[arg(long = "trace", global = true)]
    pub trace: bool,

    /// Control color output: auto (default), always, or never
    #[arg(long = "color", global = true, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Set log verbosity level (error, warn, info, debug, trace)
    #[arg(
        long = "log-level",
        global = true,
        value_enum,
        default_value = "warn",
        help_heading = "Debugging"
    )]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Override API base URL
    #[arg(long = "api-url", global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Override API key
    #[arg(long = "api-key", global = true, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Override default project
    #[arg(long = "project", short = 'p', global = true, value_name = "NAME")]
    pub project: Option<String>,

    /// Output format: table, json, yaml
    #[arg(long = "output", short = 'o', global = true, value_enum)]
    pub output: Option<OutputFormat>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Authenticate via OAuth 2.0 browser-based login (PKCE)
    Login(LoginCli),

    /// Clear stored authentication tokens
    Logout(LogoutCli),

    /// Show current authentication status
    Whoami(WhoamiCli),

    /// Manage projects
    Project(ProjectCli),

    /// Manage contexts (persistent memory)
    Context(ContextCli),

    /// Manage tickets
    Ticket(TicketCli),

    /// Manage CLI configuration
    Config(ConfigCli),

    /// Print the stompy CLI version
    Version(VersionCli),

    /// Update stompy to the latest version
    Update(UpdateCli),

    /// Generate shell completion scripts
    Completion(CompletionCommand),
}

impl Commands {
    /// Commands that run without resolving an API credential.
    pub fn skips_auth(&self) -> bool {
        matches!(
            self,
            Commands::Login(_)
                | Commands::Logout(_)
                | Commands::Whoami(_)
                | Commands::Version(_)
                | Commands::Update(_)
                | Commands::Config(_)
                | Commands::Completion(_)
        )
    }

    /// Commands that do not get the background release check.
    pub fn skips_update_check(&self) -> bool {
        matches!(
            self,
            Commands::Update(_) | Commands::Version(_) | Commands::Completion(_)
        )
    }
}

/// Completion command.
#[derive(Args)]
pub struct CompletionCommand {
    /// Shell to generate completions for.
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
