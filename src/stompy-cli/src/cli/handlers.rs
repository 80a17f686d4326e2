//! Command dispatch.

use std::io::{self, Write};

use anyhow::Result;
use clap::CommandFactory;
use clap_complete::{Shell, generate};

use crate::app::AppContext;
use crate::cli::args::{Cli, Commands, CompletionCommand};

/// Run `command` against the per-invocation state.
///
/// Commands outside the auth skip list resolve their credential before
/// doing anything else, so a missing login fails fast.
pub async fn dispatch_command(command: Commands, app: &mut AppContext) -> Result<()> {
    if !command.skips_auth() {
        app.resolve_auth_token().await?;
    }

    match command {
        Commands::Login(login_cli) => login_cli.run(app).await,
        Commands::Logout(logout_cli) => logout_cli.run(app).await,
        Commands::Whoami(whoami_cli) => whoami_cli.run(app).await,
        Commands::Project(project_cli) => project_cli.run(app).await,
        Commands::Context(context_cli) => context_cli.run(app).await,
        Commands::Ticket(ticket_cli) => ticket_cli.run(app).await,
        Commands::Config(config_cli) => config_cli.run(app).await,
        Commands::Version(version_cli) => version_cli.run(app).await,
        Commands::Update(update_cli) => update_cli.run(app).await,
        Commands::Completion(completion_cli) => {
            handle_completion(completion_cli);
            Ok(())
        }
    }
}

fn handle_completion(completion_cli: CompletionCommand) {
    generate_completions(completion_cli.shell, io::stdout());
}

/// Write the completion script for `shell` to `out`.
fn generate_completions<W: Write>(shell: Shell, out: W) {
    /// Swallows BrokenPipe so `stompy completion bash | head` exits cleanly.
    struct BrokenPipeIgnorer<W: Write> {
        inner: W,
    }

    impl<W: Write> Write for BrokenPipeIgnorer<W> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            match self.inner.write(buf) {
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(buf.len()),
                other => other,
            }
        }

        fn flush(&mut self) -> io::Result<()> {
            match self.inner.flush() {
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                other => other,
            }
        }
    }

    let mut cmd = Cli::command();
    let mut writer = BrokenPipeIgnorer { inner: out };
    generate(shell, &mut cmd, "stompy", &mut writer);
}
