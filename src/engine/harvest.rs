//! engine::harvest
//!
//! Commit harvester: the ordered commits a publisher must replay.
//!
//! Given a base and a branch, lists the commits reachable from the branch
//! but not the base, oldest first, and reads each one in full. A publisher
//! that cannot simply push (for example one that recreates commits through
//! a signing API) replays exactly this list.

use tracing::warn;

use crate::core::commit::Commit;
use crate::git::{CommandSurface, GitError};

/// Build the commits on `branch` that `base` lacks, oldest first.
///
/// Change lines the commit parser could not type are kept on each
/// [`Commit::unparsed_changes`] and logged; they never fail the harvest.
///
/// # Errors
///
/// Propagates any command failure, or [`GitError::MalformedCommit`] if a
/// commit record is unreadable.
pub fn build_branch_commits<G: CommandSurface + ?Sized>(
    git: &G,
    base: &str,
    branch: &str,
) -> Result<Vec<Commit>, GitError> {
    let range = format!("{base}..{branch}");
    let listing = git.rev_list(&[&range], &["--reverse"])?;

    let mut commits = Vec::new();
    for id in listing.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let commit = git.get_commit(id)?;
        for line in &commit.unparsed_changes {
            warn!(commit = %commit.id.short(7), entry = %line, "skipping unexpected diff entry");
        }
        commits.push(commit);
    }
    Ok(commits)
}
