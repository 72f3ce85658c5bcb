//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Only warnings and errors on stderr

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::types::{BranchName, RemoteName, TypeError};

/// Proposer - keep a proposal branch in step with an automation run
#[derive(Parser, Debug)]
#[command(name = "proposer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if proposer was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

fn parse_branch(s: &str) -> Result<BranchName, TypeError> {
    BranchName::new(s)
}

fn parse_remote(s: &str) -> Result<RemoteName, TypeError> {
    RemoteName::new(s)
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create or refresh a proposal branch from the working checkout
    #[command(
        name = "reconcile",
        long_about = "Create or refresh a proposal branch from the working checkout.\n\n\
            Uncommitted changes (optionally limited with --add-path) are committed on a \
            scratch branch, replayed onto the base if the checkout is on something else, \
            and compared with the proposal branch on the remote. The proposal branch is \
            created, reset, or left alone, and the outcome is reported as one of: \
            none, created, updated, not-updated.\n\n\
            Unrelated uncommitted changes are stashed for the duration of the run and \
            restored afterwards.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Propose everything changed in the checkout against its current branch
    proposer reconcile --branch bot/update-deps

    # Propose only lockfile changes against main, then push
    proposer reconcile --branch bot/lockfile --base main --add-path Cargo.lock --push

    # Machine-readable result for a later step
    proposer reconcile --branch bot/update-deps --json"
    )]
    Reconcile {
        /// The proposal branch
        #[arg(long, value_parser = parse_branch)]
        branch: BranchName,

        /// Branch to propose against (default: the checked-out branch)
        #[arg(long, value_parser = parse_branch)]
        base: Option<BranchName>,

        /// Remote holding the proposal branch (default: config branch_remote)
        #[arg(long, value_parser = parse_remote)]
        remote: Option<RemoteName>,

        /// Commit message for uncommitted changes (default: config commit_message)
        #[arg(short, long)]
        message: Option<String>,

        /// Add a Signed-off-by trailer to the commit
        #[arg(long)]
        signoff: bool,

        /// Only stage paths matching this pathspec (repeatable)
        #[arg(long = "add-path", value_name = "PATHSPEC")]
        add_paths: Vec<String>,

        /// Push the branch when it was created or updated
        #[arg(long)]
        push: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the commits on a branch that its base lacks
    #[command(
        name = "commits",
        long_about = "List the commits on a branch that its base lacks, oldest first, \
            with their file-level changes.\n\n\
            Change lines that are not plain additions, modifications, or deletions \
            are reported as unparsed rather than failing the listing.",
        after_help = "\
WORKFLOW EXAMPLES:
    # What would a publisher have to replay?
    proposer commits --base main --branch bot/update-deps

    # Same, for a script
    proposer commits --base main --branch bot/update-deps --json"
    )]
    Commits {
        /// The base branch
        #[arg(long, value_parser = parse_branch)]
        base: BranchName,

        /// The branch whose commits to list
        #[arg(long, value_parser = parse_branch)]
        branch: BranchName,

        /// Print the commits as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash
    proposer completion bash > ~/.local/share/bash-completion/completions/proposer

    # Zsh
    proposer completion zsh > \"${fpath[1]}/_proposer\""
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
