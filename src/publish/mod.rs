//! publish
//!
//! Pushing a reconciled proposal branch to its remote.
//!
//! # Architecture
//!
//! Publishing sits outside the reconciliation engine: it consumes a
//! [`ReconciliationResult`] and pushes only when the action is `created` or
//! `updated`. Pushes use `--force-with-lease`: a reset proposal branch
//! rewrites the remote one, and a push made elsewhere since the last fetch
//! is never overwritten.
//!
//! Transient failures are retried according to a caller-supplied
//! [`RetryPolicy`].

mod retry;

pub use retry::{
    is_transient, RetryPolicy, DEFAULT_INITIAL_BACKOFF, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_BACKOFF,
};

use thiserror::Error;
use tracing::info;

use crate::core::types::{BranchName, RemoteName};
use crate::engine::reconcile::ReconciliationResult;
use crate::git::{CommandSurface, GitError};

/// Errors from publishing.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The push failed and the policy did not allow (further) retries.
    #[error("push of '{branch}' to '{remote}' failed after {attempts} attempt(s): {source}")]
    PushFailed {
        branch: BranchName,
        remote: RemoteName,
        attempts: u32,
        #[source]
        source: GitError,
    },
}

/// Force-with-lease push `branch` to the same name on `remote`.
///
/// # Errors
///
/// [`PublishError::PushFailed`] once the policy stops retrying.
pub fn push_branch<G: CommandSurface + ?Sized>(
    git: &G,
    remote: &RemoteName,
    branch: &BranchName,
    policy: &RetryPolicy,
) -> Result<(), PublishError> {
    let refspec = format!("{branch}:refs/heads/{branch}");
    policy
        .run(|attempt| {
            info!(branch = %branch, remote = %remote, attempt, "pushing");
            git.push(&["--force-with-lease", remote.as_str(), refspec.as_str()])
        })
        .map(|_| ())
        .map_err(|(source, attempts)| PublishError::PushFailed {
            branch: branch.clone(),
            remote: remote.clone(),
            attempts,
            source,
        })
}

/// Push the reconciled branch if its action calls for it.
///
/// Returns whether a push happened.
pub fn publish<G: CommandSurface + ?Sized>(
    git: &G,
    remote: &RemoteName,
    branch: &BranchName,
    result: &ReconciliationResult,
    policy: &RetryPolicy,
) -> Result<bool, PublishError> {
    if !result.action.should_push() {
        info!(branch = %branch, action = %result.action, "nothing to push");
        return Ok(false);
    }
    push_branch(git, remote, branch, policy)?;
    Ok(true)
}
