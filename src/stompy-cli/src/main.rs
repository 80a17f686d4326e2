//! stompy CLI - main entry point.
//!
//! Parses arguments, sets up logging, starts the background release check
//! and dispatches to the command. Any command error is printed once and the
//! process exits with status 1.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use stompy_cli::VERSION;
use stompy_cli::app::AppContext;
use stompy_cli::cli::{Cli, ColorMode, LogLevel, dispatch_command};
use stompy_cli::styled_output::print_error;
use stompy_cli::update_check::{BackgroundCheck, update_notice};

fn init_logging(cli: &Cli) {
    let log_level = if cli.trace {
        LogLevel::Trace
    } else if cli.verbose {
        LogLevel::Debug
    } else if let Ok(env_level) = std::env::var("STOMPY_LOG_LEVEL") {
        LogLevel::from_str_loose(&env_level).unwrap_or(cli.log_level)
    } else {
        cli.log_level
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_filter_str()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut app = AppContext::load(cli.global)?;

    let check = if cli.command.skips_update_check() {
        None
    } else {
        Some(BackgroundCheck::spawn(
            app.config.config_dir().to_path_buf(),
            VERSION,
        ))
    };

    dispatch_command(cli.command, &mut app).await?;

    // Notices would corrupt machine-readable output.
    if app.output().is_table()
        && let Some(latest) = check.and_then(BackgroundCheck::try_take)
    {
        eprintln!("{}", update_notice(&latest));
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // SAFETY: Environment variable mutations happen early before threads spawn
    match cli.color {
        ColorMode::Never => unsafe { std::env::set_var("NO_COLOR", "1") },
        ColorMode::Always => unsafe { std::env::remove_var("NO_COLOR") },
        ColorMode::Auto => {}
    }

    init_logging(&cli);

    if let Err(e) = run(cli).await {
        tracing::debug!(error = ?e, "Command failed");
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}
