//! `wn`: deploy helper for Webbynode git applications
//!
//! Parses the command line, dispatches to a handler and reports errors as
//! plain text.

use anyhow::{Context as _, Result};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use webbynode::{Command, Context, DispatchOutcome, GitCli, Invocation, Settings, WebbynodeError};

mod handlers;
mod prompt;
mod templates;

use prompt::TerminalPrompt;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("WEBBYNODE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(std::env::args().skip(1).collect()).await {
        Ok(code) => code,
        Err(e) => match e.downcast_ref::<WebbynodeError>() {
            // The remote output was already shown
            Some(err @ WebbynodeError::RemoteCommandFailed { .. }) => {
                debug!("{}", err);
                ExitCode::from(err.exit_status())
            }
            Some(err) => {
                eprintln!("{:#}", e);
                ExitCode::from(err.exit_status())
            }
            None => {
                eprintln!("{:#}", e);
                ExitCode::FAILURE
            }
        },
    }
}

async fn run(args: Vec<String>) -> Result<ExitCode> {
    let command = match Command::parse(args) {
        Invocation::Help => {
            print!("{}", templates::HELP);
            return Ok(ExitCode::SUCCESS);
        }
        Invocation::Run(command) => command,
    };
    debug!("Parsed command: {:?}", command);

    let root = std::env::current_dir().context("Cannot determine the working directory")?;
    let mut ctx = Context::deferred(
        &root,
        Settings::from_env,
        Arc::new(GitCli::new(&root)),
        Arc::new(TerminalPrompt),
    );

    let outcome = handlers::dispatcher().dispatch(&mut ctx, &command).await;

    if let Err(e) = ctx.shutdown().await {
        warn!("Failed to close the remote session: {}", e);
    }

    match outcome? {
        DispatchOutcome::Completed => {}
        DispatchOutcome::UnknownCommand(name) => {
            println!("{}", WebbynodeError::UnknownCommand { name });
        }
    }
    Ok(ExitCode::SUCCESS)
}
