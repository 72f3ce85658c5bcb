//! commits command - List the commits a publisher would replay

use anyhow::{Context as _, Result};
use serde::Serialize;

use super::open;
use super::reconcile::print_commits;
use crate::cli::Context;
use crate::core::commit::Commit;
use crate::core::types::BranchName;
use crate::engine::graph::{self, AheadBehind};
use crate::engine::harvest::build_branch_commits;

#[derive(Serialize)]
struct Listing<'a> {
    base: &'a BranchName,
    branch: &'a BranchName,
    #[serde(flatten)]
    counts: AheadBehind,
    commits: &'a [Commit],
}

/// Run the commit harvester for `base..branch` and print the commits.
pub fn commits(ctx: &Context, base: &BranchName, branch: &BranchName, json: bool) -> Result<()> {
    let (git, _config) = open(ctx)?;

    let counts = graph::ahead_behind(&git, base.as_str(), branch.as_str())
        .with_context(|| format!("Failed to compare '{base}' and '{branch}'"))?;
    let commits = build_branch_commits(&git, base.as_str(), branch.as_str())
        .with_context(|| format!("Failed to read commits of '{branch}'"))?;

    if json {
        let listing = Listing {
            base,
            branch,
            counts,
            commits: &commits,
        };
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!(
        "{branch}: {} ahead of {base}, {} behind",
        counts.ahead, counts.behind
    );
    if !ctx.quiet {
        print_commits(&commits);
    }
    Ok(())
}
