//! CLI styling and formatting.
//!
//! Defines ANSI colors for the clap help output.

use clap::builder::styling::{AnsiColor, Effects, Styles};

/// Help theme: teal headers, green literals.
pub fn get_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Yellow.on_default())
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
        .valid(AnsiColor::Cyan.on_default())
        .invalid(AnsiColor::Yellow.on_default())
}

/// After-help section with environment variables documentation.
pub const AFTER_HELP: &str = "\
ENVIRONMENT VARIABLES
    STOMPY_HOME          Override config directory (default: ~/.stompy)
    STOMPY_API_KEY       API key (alternative to --api-key)
    STOMPY_API_URL       API base URL (alternative to --api-url)
    STOMPY_PROJECT       Active project (alternative to --project)
    STOMPY_LOG_LEVEL     Log verbosity (error, warn, info, debug, trace)
    NO_COLOR             Disable colored output (set to '1' or 'true')

PATHS
    Config      ~/.stompy/config.yaml";
