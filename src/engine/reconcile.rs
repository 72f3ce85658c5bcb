//! engine::reconcile
//!
//! Branch reconciler: turns the state of a working checkout into a proposal
//! branch that cleanly represents the run's changes relative to a base.
//!
//! # State machine
//!
//! One call walks these steps strictly in order. A failure at any step
//! aborts the rest; the [`Workspace`] guard still restores the working base
//! and pops the stash. It deletes the temp branch only if that branch holds
//! no commits the working base lacks.
//!
//! 1. Determine the working base (branch, or detached commit)
//! 2. Resolve the base (`request.base` or the working base)
//! 3. Stage local changes onto a temp branch
//! 4. Stash whatever is left
//! 5. Reset a branch working base to its remote counterpart
//! 6. Rebase onto the base if the working base is something else
//! 7. Estimate how deep the proposal branch must be fetched
//! 8. Fetch the proposal branch, then create it or decide whether to reset it
//! 9. Compute whether the branch has a diff with the base
//! 10. Harvest the branch commits if it does
//! 11. Release the workspace
//!
//! # Tie-break
//!
//! "No diff with base" always wins. If the temp branch is not ahead of the
//! base, an existing proposal branch is reset to it even when that erases
//! the branch's own history (the squash-merge case).
//!
//! # Example
//!
//! ```ignore
//! use proposer::engine::reconcile::{reconcile, ReconcileOptions, ReconcileRequest};
//!
//! let result = reconcile(&git, &request, &ReconcileOptions::default())?;
//! if result.action.should_push() {
//!     // hand the branch to a publisher
//! }
//! ```

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use super::graph;
use super::harvest::build_branch_commits;
use super::scope::Workspace;
use crate::core::commit::Commit;
use crate::core::types::{BranchName, Oid, RemoteName, TempBranch};
use crate::git::{CommandSurface, Diagnostic, GitError};

// =============================================================================
// Errors
// =============================================================================

/// Errors from reconciliation.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The request cannot be satisfied from the current checkout.
    ///
    /// Raised before any mutation.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A git operation failed where success was required.
    #[error(transparent)]
    Git(#[from] GitError),

    /// Committing staged changes failed for a reason other than there being
    /// nothing to commit.
    #[error("unexpected error committing changes: {stderr}")]
    UnexpectedCommitFailure {
        /// Trimmed standard error of `git commit`
        stderr: String,
    },

    /// A commit could not be replayed onto the base.
    #[error("cherry-pick of {commit} failed: {stderr}")]
    CherryPickFailed {
        /// The commit being replayed
        commit: String,
        /// Trimmed standard error of `git cherry-pick`
        stderr: String,
    },

    /// Reconciliation succeeded but the temp branch, checkout or stash could
    /// not be restored.
    #[error("cleanup after reconciliation failed: {source}")]
    Cleanup {
        #[source]
        source: GitError,
    },
}

// =============================================================================
// Inputs
// =============================================================================

/// What the checkout was on when the run started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkingBase {
    /// A checked-out branch.
    Branch(BranchName),
    /// A detached HEAD.
    Commit(Oid),
}

impl WorkingBase {
    /// The ref to check out to return to this base.
    pub fn as_str(&self) -> &str {
        match self {
            WorkingBase::Branch(name) => name.as_str(),
            WorkingBase::Commit(oid) => oid.as_str(),
        }
    }

    /// Whether the checkout was on a branch.
    pub fn is_branch(&self) -> bool {
        matches!(self, WorkingBase::Branch(_))
    }
}

impl std::fmt::Display for WorkingBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkingBase::Branch(name) => write!(f, "branch '{name}'"),
            WorkingBase::Commit(oid) => write!(f, "commit {}", oid.short(7)),
        }
    }
}

/// The caller's intent for one reconciliation.
#[derive(Debug, Clone)]
pub struct ReconcileRequest {
    /// Message for the commit of uncommitted changes.
    pub commit_message: String,
    /// The branch to propose against. Defaults to the working base.
    pub base: Option<BranchName>,
    /// The proposal branch.
    pub branch: BranchName,
    /// Remote holding the proposal branch.
    pub remote: RemoteName,
    /// Add a `Signed-off-by` trailer to the commit.
    pub signoff: bool,
    /// Pathspecs limiting what is staged. Empty means everything.
    pub add_paths: Vec<String>,
}

/// Tunables that come from configuration rather than the request.
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Remote the base is fetched from and the working base is reset to.
    pub base_remote: RemoteName,
    /// When the proposal remote has this name, base fetches are not shallow.
    pub fork_remote: RemoteName,
    /// Commits added to the ahead count when fetching the proposal branch.
    pub fetch_depth_margin: usize,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            base_remote: RemoteName::from_static("origin"),
            fork_remote: RemoteName::from_static("fork"),
            fetch_depth_margin: 10,
        }
    }
}

// =============================================================================
// Output
// =============================================================================

/// What happened to the proposal branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// The branch did not exist remotely and has nothing to propose.
    None,
    /// The branch did not exist remotely and now has a diff with base.
    Created,
    /// The branch exists remotely and the local branch now differs from it.
    Updated,
    /// The branch exists remotely and is unchanged.
    NotUpdated,
}

impl Action {
    /// Whether a publisher should push the branch.
    pub fn should_push(self) -> bool {
        matches!(self, Action::Created | Action::Updated)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Action::None => "none",
            Action::Created => "created",
            Action::Updated => "updated",
            Action::NotUpdated => "not-updated",
        };
        write!(f, "{s}")
    }
}

/// The sole output of one reconciliation.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationResult {
    pub action: Action,
    pub base: BranchName,
    pub has_diff_with_base: bool,
    pub base_commit: Commit,
    pub head_id: Oid,
    /// Commits on the branch but not the base, oldest first. Empty unless
    /// `has_diff_with_base`.
    pub branch_commits: Vec<Commit>,
}

/// Why an existing proposal branch is being reset to the temp branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResetReason {
    /// Branch and temp branch have different content.
    ContentDiffers,
    /// They sit at different distances from base (base was force-pushed).
    AheadCountDiffers,
    /// The temp branch adds nothing to base.
    NotAheadOfBase,
    /// Same distance from base, but the recent commits differ (partial merge).
    RecentCommitsDiffer,
}

impl std::fmt::Display for ResetReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResetReason::ContentDiffers => "content differs",
            ResetReason::AheadCountDiffers => "ahead count differs",
            ResetReason::NotAheadOfBase => "no changes beyond base",
            ResetReason::RecentCommitsDiffer => "recent commits differ",
        };
        write!(f, "{s}")
    }
}

// =============================================================================
// Reconciler
// =============================================================================

/// Run one reconciliation.
///
/// # Errors
///
/// - [`ReconcileError::Configuration`] for a detached checkout with no base,
///   or a proposal branch equal to the base or working base
/// - [`ReconcileError::UnexpectedCommitFailure`] / [`ReconcileError::CherryPickFailed`]
/// - [`ReconcileError::Git`] for any other required git operation
/// - [`ReconcileError::Cleanup`] if everything succeeded except restoring the checkout
pub fn reconcile<G: CommandSurface + ?Sized>(
    git: &G,
    request: &ReconcileRequest,
    options: &ReconcileOptions,
) -> Result<ReconciliationResult, ReconcileError> {
    Reconciler {
        git,
        request,
        options,
    }
    .run()
}

struct Reconciler<'a, G: CommandSurface + ?Sized> {
    git: &'a G,
    request: &'a ReconcileRequest,
    options: &'a ReconcileOptions,
}

/// Outcome of fetching and deciding the proposal branch.
struct BranchFate {
    action: Action,
    has_diff_with_base: bool,
}

impl<'a, G: CommandSurface + ?Sized> Reconciler<'a, G> {
    fn run(&self) -> Result<ReconciliationResult, ReconcileError> {
        let working_base = self.determine_working_base()?;
        let base = self.resolve_base(&working_base)?;
        info!(
            working_base = %working_base,
            base = %base,
            branch = %self.request.branch,
            "reconciling"
        );

        let mut workspace = Workspace::enter(self.git, &working_base, TempBranch::generate())?;
        let temp = workspace.temp().as_str().to_string();

        self.stage_local_changes()?;
        workspace.record_stash(self.git.stash_push(&["--include-untracked"])?);
        self.reset_working_base(&working_base)?;
        self.rebase_if_needed(&working_base, &base, &temp)?;

        let temp_ahead = graph::commits_ahead(self.git, base.as_str(), &temp)?;
        let depth = fetch_depth(temp_ahead, self.options.fetch_depth_margin);
        let fate = if self.fetch_remote_branch(depth) {
            self.update_existing(&base, &temp, temp_ahead)?
        } else {
            self.create_new(&base, &temp)?
        };

        let branch = self.request.branch.as_str();
        let base_commit = self.git.get_commit(base.as_str())?;
        let head_id = self.git.rev_parse(branch)?;
        let branch_commits = if fate.has_diff_with_base {
            build_branch_commits(self.git, base.as_str(), branch)?
        } else {
            Vec::new()
        };

        workspace
            .release()
            .map_err(|source| ReconcileError::Cleanup { source })?;

        info!(action = %fate.action, has_diff_with_base = fate.has_diff_with_base, "reconciled");
        Ok(ReconciliationResult {
            action: fate.action,
            base,
            has_diff_with_base: fate.has_diff_with_base,
            base_commit,
            head_id,
            branch_commits,
        })
    }

    // =========================================================================
    // Steps 1-2: bases
    // =========================================================================

    fn determine_working_base(&self) -> Result<WorkingBase, ReconcileError> {
        match self.git.symbolic_head()? {
            Some(name) => {
                let name = BranchName::new(name).map_err(GitError::from)?;
                Ok(WorkingBase::Branch(name))
            }
            None => {
                if self.request.base.is_none() {
                    return Err(ReconcileError::Configuration(
                        "when in detached HEAD state, a base must be supplied".into(),
                    ));
                }
                Ok(WorkingBase::Commit(self.git.rev_parse("HEAD")?))
            }
        }
    }

    fn resolve_base(&self, working_base: &WorkingBase) -> Result<BranchName, ReconcileError> {
        let base = match (&self.request.base, working_base) {
            (Some(base), _) => base.clone(),
            (None, WorkingBase::Branch(name)) => name.clone(),
            (None, WorkingBase::Commit(_)) => {
                return Err(ReconcileError::Configuration(
                    "when in detached HEAD state, a base must be supplied".into(),
                ))
            }
        };

        let branch = &self.request.branch;
        if *branch == base {
            return Err(ReconcileError::Configuration(format!(
                "proposal branch '{branch}' must differ from base '{base}'"
            )));
        }
        if let WorkingBase::Branch(name) = working_base {
            if name == branch {
                return Err(ReconcileError::Configuration(format!(
                    "working base '{name}' is the proposal branch itself; check out another branch"
                )));
            }
        }
        Ok(base)
    }

    // =========================================================================
    // Steps 3-6: staging and rebase
    // =========================================================================

    fn stage_local_changes(&self) -> Result<(), ReconcileError> {
        let paths = &self.request.add_paths;
        if !self.git.is_dirty(true, paths)? {
            debug!("no uncommitted changes in scope");
            return Ok(());
        }

        info!("committing uncommitted changes");
        self.git.add(paths)?;
        let mut options = vec!["-m", self.request.commit_message.as_str()];
        if self.request.signoff {
            options.push("--signoff");
        }
        let output = self.git.commit(&options, true)?;
        if output.success() || Diagnostic::NothingToCommit.matches(&output) {
            Ok(())
        } else {
            Err(ReconcileError::UnexpectedCommitFailure {
                stderr: output.stderr.trim().to_string(),
            })
        }
    }

    fn reset_working_base(&self, working_base: &WorkingBase) -> Result<(), ReconcileError> {
        if let WorkingBase::Branch(name) = working_base {
            let tracking = self.options.base_remote.tracking(name);
            debug!(working_base = %name, to = %tracking, "resetting working base");
            self.git.checkout(name.as_str(), None)?;
            self.git.reset_hard(&tracking)?;
        }
        Ok(())
    }

    fn rebase_if_needed(
        &self,
        working_base: &WorkingBase,
        base: &BranchName,
        temp: &str,
    ) -> Result<(), ReconcileError> {
        if working_base.as_str() == base.as_str() {
            return Ok(());
        }
        info!(from = %working_base, onto = %base, "rebasing changes onto base");

        self.fetch_base(base)?;
        self.git.checkout(base.as_str(), None)?;

        let range = format!("{}..{temp}", working_base.as_str());
        let listing = self.git.rev_list(&[range.as_str(), "--", "."], &["--reverse"])?;
        for commit in listing.lines().map(str::trim).filter(|l| !l.is_empty()) {
            self.replay(commit)?;
        }

        self.git.checkout(temp, Some("HEAD"))?;
        self.fetch_base(base)?;
        Ok(())
    }

    fn fetch_base(&self, base: &BranchName) -> Result<(), GitError> {
        let mut options = vec!["--force"];
        if self.request.remote != self.options.fork_remote {
            options.push("--depth=1");
        }
        let refspec = format!("{base}:{base}");
        self.git
            .fetch(&[&refspec], self.options.base_remote.as_str(), &options)
    }

    fn replay(&self, commit: &str) -> Result<(), ReconcileError> {
        let output = self.git.cherry_pick(
            &["--strategy=recursive", "--strategy-option=theirs", commit],
            true,
        )?;
        if output.success() {
            return Ok(());
        }
        if Diagnostic::CherryPickEmpty.matches(&output) {
            debug!(commit, "replayed commit is empty on base; skipping");
            if let Err(e) = self.git.cherry_pick(&["--skip"], false) {
                debug!(error = %e, "cherry-pick --skip failed");
            }
            return Ok(());
        }
        Err(ReconcileError::CherryPickFailed {
            commit: commit.to_string(),
            stderr: output.stderr.trim().to_string(),
        })
    }

    // =========================================================================
    // Step 8: the proposal branch
    // =========================================================================

    /// Shallow-fetch the proposal branch. `false` means it does not exist.
    fn fetch_remote_branch(&self, depth: usize) -> bool {
        let branch = &self.request.branch;
        let remote = &self.request.remote;
        let refspec = format!("{branch}:refs/remotes/{}", remote.tracking(branch));
        let depth_arg = format!("--depth={depth}");
        match self
            .git
            .fetch(&[&refspec], remote.as_str(), &["--force", depth_arg.as_str()])
        {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "proposal branch fetch failed; treating as absent");
                false
            }
        }
    }

    fn create_new(&self, base: &BranchName, temp: &str) -> Result<BranchFate, ReconcileError> {
        let branch = self.request.branch.as_str();
        info!(
            branch,
            remote = %self.request.remote,
            "proposal branch does not exist remotely; creating"
        );
        self.git.checkout(branch, Some(temp))?;

        let has_diff_with_base = graph::is_ahead(self.git, base.as_str(), branch)?;
        let action = if has_diff_with_base {
            info!(branch, base = %base, "created branch is ahead of base");
            Action::Created
        } else {
            info!(branch, base = %base, "created branch has no diff with base; not proposing");
            Action::None
        };
        Ok(BranchFate {
            action,
            has_diff_with_base,
        })
    }

    fn update_existing(
        &self,
        base: &BranchName,
        temp: &str,
        temp_ahead: usize,
    ) -> Result<BranchFate, ReconcileError> {
        let branch = self.request.branch.as_str();
        info!(branch, remote = %self.request.remote, "proposal branch exists remotely");
        self.git.checkout(branch, None)?;

        if let Some(reason) = self.reset_reason(base, temp, temp_ahead)? {
            info!(branch, %reason, "resetting branch to the reconciled changes");
            self.git.checkout(branch, Some(temp))?;
        }

        let tracking = self.request.remote.tracking(&self.request.branch);
        let action = if graph::is_even(self.git, &tracking, branch)? {
            info!(branch, "branch is even with its remote; not updated");
            Action::NotUpdated
        } else {
            info!(branch, "branch differs from its remote; updated");
            Action::Updated
        };

        Ok(BranchFate {
            action,
            has_diff_with_base: graph::is_ahead(self.git, base.as_str(), branch)?,
        })
    }

    fn reset_reason(
        &self,
        base: &BranchName,
        temp: &str,
        temp_ahead: usize,
    ) -> Result<Option<ResetReason>, ReconcileError> {
        let branch = self.request.branch.as_str();
        if self.git.has_diff(&[&format!("{branch}..{temp}")])? {
            return Ok(Some(ResetReason::ContentDiffers));
        }
        let branch_ahead = graph::commits_ahead(self.git, base.as_str(), branch)?;
        if branch_ahead != temp_ahead {
            return Ok(Some(ResetReason::AheadCountDiffers));
        }
        if temp_ahead == 0 {
            return Ok(Some(ResetReason::NotAheadOfBase));
        }
        if self.commits_have_diff(branch, temp, temp_ahead) {
            return Ok(Some(ResetReason::RecentCommitsDiffer));
        }
        Ok(None)
    }

    /// Compare the last `depth` commits of two refs by their diffstat.
    ///
    /// Fails open: any error means "no difference".
    fn commits_have_diff(&self, left: &str, right: &str, depth: usize) -> bool {
        let stat = |reference: &str| -> Result<String, GitError> {
            let range = format!("{reference}..{reference}~{depth}");
            let output = self.git.exec(&["diff", "--stat", range.as_str()], false)?;
            Ok(output.stdout.trim().to_string())
        };
        match (stat(left), stat(right)) {
            (Ok(a), Ok(b)) => a != b,
            (Err(e), _) | (_, Err(e)) => {
                info!("failed optional check of commits diff; skipping");
                debug!(error = %e, "commits diff check");
                false
            }
        }
    }
}

/// How deep to fetch the proposal branch given the temp branch's lead.
fn fetch_depth(ahead: usize, margin: usize) -> usize {
    if ahead > 0 {
        ahead + margin
    } else {
        margin
    }
}
