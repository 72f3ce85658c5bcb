//! reconcile command - Create or refresh a proposal branch
//!
//! Flags override configuration: `--remote` over `branch_remote`,
//! `--message` over `commit_message`, and `--signoff` turns the trailer on
//! even when the config leaves it off.

use anyhow::{Context as _, Result};
use serde::Serialize;

use super::open;
use crate::cli::Context;
use crate::core::commit::Commit;
use crate::core::types::{BranchName, RemoteName};
use crate::engine::{self, ReconcileOptions, ReconcileRequest, ReconciliationResult};
use crate::publish::{self, RetryPolicy};

/// Parsed arguments of `proposer reconcile`.
#[derive(Debug, Clone)]
pub struct ReconcileArgs {
    pub branch: BranchName,
    pub base: Option<BranchName>,
    pub remote: Option<RemoteName>,
    pub message: Option<String>,
    pub signoff: bool,
    pub add_paths: Vec<String>,
    pub push: bool,
    pub json: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    #[serde(flatten)]
    result: &'a ReconciliationResult,
    pushed: bool,
}

/// Run the reconciler, optionally push, and print the result.
pub fn reconcile(ctx: &Context, args: ReconcileArgs) -> Result<()> {
    let (git, config) = open(ctx)?;

    let remote = match args.remote {
        Some(remote) => remote,
        None => RemoteName::new(config.branch_remote())?,
    };
    let request = ReconcileRequest {
        commit_message: args
            .message
            .unwrap_or_else(|| config.commit_message().to_string()),
        base: args.base,
        branch: args.branch,
        remote,
        signoff: args.signoff || config.signoff(),
        add_paths: args.add_paths,
    };
    let options = ReconcileOptions {
        base_remote: RemoteName::new(config.base_remote())?,
        fork_remote: RemoteName::new(config.fork_remote())?,
        fetch_depth_margin: config.fetch_depth_margin(),
    };

    let result = engine::reconcile(&git, &request, &options)
        .with_context(|| format!("Failed to reconcile '{}'", request.branch))?;

    let pushed = if args.push {
        let policy = RetryPolicy::from_config(&config.push());
        publish::publish(&git, &request.remote, &request.branch, &result, &policy)?
    } else {
        false
    };

    if args.json {
        let report = Report {
            result: &result,
            pushed,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(ctx, &request.branch, &result, pushed);
    }
    Ok(())
}

fn print_summary(ctx: &Context, branch: &BranchName, result: &ReconciliationResult, pushed: bool) {
    println!("{}: {}", branch, result.action);
    if ctx.quiet {
        return;
    }

    println!("  Base: {} ({})", result.base, result.base_commit.id.short(7));
    println!("  Head: {}", result.head_id.short(7));
    println!(
        "  Diff with base: {}",
        if result.has_diff_with_base { "yes" } else { "no" }
    );
    if pushed {
        println!("  Pushed: yes");
    }
    if !result.branch_commits.is_empty() {
        println!("  Commits:");
        print_commits(&result.branch_commits);
    }
}

/// Print one line per commit, with change counts.
pub(super) fn print_commits(commits: &[Commit]) {
    for commit in commits {
        let unparsed = if commit.unparsed_changes.is_empty() {
            String::new()
        } else {
            format!(", {} unparsed", commit.unparsed_changes.len())
        };
        println!(
            "    {} {} ({} file(s){})",
            commit.id.short(7),
            commit.subject,
            commit.changes.len(),
            unparsed
        );
    }
}
