//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Opens the repository and loads configuration
//! 2. Calls the engine to execute the command
//! 3. Formats and displays output
//!
//! Handlers do NOT perform repository mutations directly.

mod commits;
mod completion;
mod reconcile;

// Re-export command functions for testing and direct invocation
pub use commits::commits;
pub use completion::completion;
pub use reconcile::{reconcile, ReconcileArgs};

use super::args::Command;
use super::Context;
use anyhow::{Context as _, Result};

use crate::core::config::Config;
use crate::git::Git;

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Reconcile {
            branch,
            base,
            remote,
            message,
            signoff,
            add_paths,
            push,
            json,
        } => reconcile(
            ctx,
            ReconcileArgs {
                branch,
                base,
                remote,
                message,
                signoff,
                add_paths,
                push,
                json,
            },
        ),
        Command::Commits { base, branch, json } => commits(ctx, &base, &branch, json),
        Command::Completion { shell } => completion(shell),
    }
}

/// Open the repository and its configuration.
fn open(ctx: &Context) -> Result<(Git, Config)> {
    let cwd = ctx.cwd()?;
    let git = Git::open(&cwd).context("Failed to open repository")?;
    let config = Config::load(Some(git.work_dir())).context("Failed to load configuration")?;
    Ok((git, config))
}
