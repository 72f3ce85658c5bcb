//! engine::scope
//!
//! Scoped ownership of the scratch state one reconciliation creates.
//!
//! # Architecture
//!
//! A [`Workspace`] is acquired right after the temp branch is created and
//! owns three things: the temp branch, the ref to restore afterwards (the
//! working base), and whether a stash entry was pushed. Release happens
//! exactly once, on every exit path:
//!
//! - [`Workspace::release`] on success. A cleanup failure is returned.
//! - `Drop` on early return or `?` propagation. Cleanup is best-effort, each
//!   failure is logged, and the error that caused the unwind is what the
//!   caller sees.
//!
//! Release order is fixed: abort any cherry-pick in progress, check out the
//! working base, delete the temp branch, pop the stash. The temp branch is
//! never the current branch when it is deleted.
//!
//! On the failure path the temp branch survives if it holds commits the
//! working base lacks. Once local changes are committed, or the working base
//! has been reset away from ad-hoc commits, it is the only ref to them.

use tracing::{debug, warn};

use super::graph;
use super::reconcile::WorkingBase;
use crate::core::types::TempBranch;
use crate::git::{CommandSurface, GitError};

/// Guard over the temp branch and stash of one reconciliation.
pub struct Workspace<'g, G: CommandSurface + ?Sized> {
    git: &'g G,
    temp: TempBranch,
    restore: String,
    stashed: bool,
    released: bool,
}

impl<'g, G: CommandSurface + ?Sized> Workspace<'g, G> {
    /// Create `temp` at the current HEAD, check it out, and take ownership.
    ///
    /// Nothing is owned if the checkout fails, so there is nothing to clean.
    pub fn enter(
        git: &'g G,
        working_base: &WorkingBase,
        temp: TempBranch,
    ) -> Result<Self, GitError> {
        git.checkout(temp.as_str(), Some("HEAD"))?;
        debug!(temp = %temp, "created temp branch");
        Ok(Self {
            git,
            temp,
            restore: working_base.as_str().to_string(),
            stashed: false,
            released: false,
        })
    }

    /// The temp branch name.
    pub fn temp(&self) -> &TempBranch {
        &self.temp
    }

    /// Record whether a stash entry was pushed and must be popped.
    pub fn record_stash(&mut self, stashed: bool) {
        self.stashed = stashed;
    }

    /// Release on the success path.
    ///
    /// Every step is attempted; the first failure is returned.
    pub fn release(mut self) -> Result<(), GitError> {
        self.released = true;
        let mut first = None;
        for step in self.steps(false) {
            if let Err(e) = step {
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }

    fn steps(&self, unwinding: bool) -> Vec<Result<(), GitError>> {
        let mut results = Vec::with_capacity(4);

        let mut keep_temp = false;
        if unwinding {
            // Fails harmlessly when no cherry-pick is in progress.
            results.push(self.git.cherry_pick(&["--abort"], true).map(|_| ()));
            keep_temp = self.holds_unique_commits();
            if keep_temp {
                warn!(
                    temp = %self.temp,
                    restore = %self.restore,
                    "keeping temp branch; it holds commits the working base lacks"
                );
            }
        }

        results.push(self.git.checkout(&self.restore, None));
        if !keep_temp {
            results.push(self.git.delete_branch(self.temp.as_str()));
        }
        if self.stashed {
            results.push(self.git.stash_pop());
        }
        results
    }

    /// Whether the temp branch is the only ref to some commit: the commit of
    /// local changes, or ad-hoc commits dropped by the working-base reset.
    /// Unknown counts as yes.
    fn holds_unique_commits(&self) -> bool {
        match graph::commits_ahead(self.git, &self.restore, self.temp.as_str()) {
            Ok(ahead) => ahead > 0,
            Err(e) => {
                debug!(error = %e, "could not compare temp branch with working base");
                true
            }
        }
    }
}

impl<G: CommandSurface + ?Sized> Drop for Workspace<'_, G> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        for step in self.steps(true) {
            if let Err(e) = step {
                warn!(error = %e, "cleanup step failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::BranchName;
    use crate::git::surface::testing::ScriptedSurface;

    fn main_base() -> WorkingBase {
        WorkingBase::Branch(BranchName::new("main").unwrap())
    }

    #[test]
    fn enter_creates_temp_at_head() {
        let git = ScriptedSurface::new();
        let temp = TempBranch::generate();
        let name = temp.as_str().to_string();
        let ws = Workspace::enter(&git, &main_base(), temp).unwrap();
        assert_eq!(git.call(0), ["checkout", "-B", name.as_str(), "HEAD", "--"]);
        ws.release().unwrap();
    }

    #[test]
    fn release_restores_then_deletes_then_pops() {
        let git = ScriptedSurface::new();
        let temp = TempBranch::generate();
        let name = temp.as_str().to_string();
        let mut ws = Workspace::enter(&git, &main_base(), temp).unwrap();
        ws.record_stash(true);
        ws.release().unwrap();

        let calls = git.calls.borrow();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[1], ["checkout", "main", "--"]);
        assert_eq!(calls[2], ["branch", "--delete", "--force", name.as_str()]);
        assert_eq!(calls[3], ["stash", "pop"]);
    }

    #[test]
    fn release_without_stash_skips_pop() {
        let git = ScriptedSurface::new();
        let ws = Workspace::enter(&git, &main_base(), TempBranch::generate()).unwrap();
        ws.release().unwrap();
        assert!(git.calls.borrow().iter().all(|c| c[0] != "stash"));
    }

    #[test]
    fn release_reports_first_failure_but_tries_everything() {
        let git = ScriptedSurface::new();
        git.respond(0, "");
        let mut ws = Workspace::enter(&git, &main_base(), TempBranch::generate()).unwrap();
        ws.record_stash(true);
        git.respond_full(1, "", "error: pathspec 'main' did not match");

        let err = ws.release().unwrap_err();
        assert!(matches!(err, GitError::CommandFailed { code: 1, .. }));
        assert_eq!(git.calls.borrow().len(), 4);
    }

    fn deletes(calls: &[Vec<String>], name: &str) -> bool {
        calls
            .iter()
            .any(|c| c.len() == 4 && c[..3] == ["branch", "--delete", "--force"] && c[3] == name)
    }

    #[test]
    fn drop_cleans_up_after_failure() {
        let git = ScriptedSurface::new();
        let temp = TempBranch::generate();
        let name = temp.as_str().to_string();
        {
            let mut ws = Workspace::enter(&git, &main_base(), temp).unwrap();
            ws.record_stash(true);
            git.respond(0, "").respond(0, "0");
        }

        let calls = git.calls.borrow();
        assert_eq!(calls[1], ["cherry-pick", "--abort"]);
        assert_eq!(calls[2][0], "rev-list");
        assert_eq!(calls[3], ["checkout", "main", "--"]);
        assert!(deletes(&calls, &name));
        assert_eq!(calls.last().unwrap(), &["stash", "pop"]);
    }

    #[test]
    fn drop_keeps_temp_holding_commits() {
        let git = ScriptedSurface::new();
        let temp = TempBranch::generate();
        let name = temp.as_str().to_string();
        {
            let mut ws = Workspace::enter(&git, &main_base(), temp).unwrap();
            ws.record_stash(true);
            git.respond(0, "").respond(0, "2");
        }

        let calls = git.calls.borrow();
        let range = format!("main...{name}");
        assert!(calls[2].contains(&range));
        assert_eq!(calls[3], ["checkout", "main", "--"]);
        assert!(!deletes(&calls, &name));
        assert_eq!(calls.last().unwrap(), &["stash", "pop"]);
    }

    #[test]
    fn drop_keeps_temp_when_comparison_fails() {
        let git = ScriptedSurface::new();
        let temp = TempBranch::generate();
        let name = temp.as_str().to_string();
        {
            let _ws = Workspace::enter(&git, &main_base(), temp).unwrap();
            git.respond(0, "").respond_full(128, "", "fatal: bad revision");
        }

        let calls = git.calls.borrow();
        assert_eq!(calls[3], ["checkout", "main", "--"]);
        assert!(!deletes(&calls, &name));
    }

    #[test]
    fn release_always_deletes_temp() {
        let git = ScriptedSurface::new();
        let temp = TempBranch::generate();
        let name = temp.as_str().to_string();
        let ws = Workspace::enter(&git, &main_base(), temp).unwrap();
        ws.release().unwrap();

        let calls = git.calls.borrow();
        assert!(calls.iter().all(|c| c[0] != "rev-list"));
        assert!(deletes(&calls, &name));
    }

    #[test]
    fn detached_base_restores_commit() {
        let git = ScriptedSurface::new();
        let oid = "abc123def4567890abc123def4567890abc12345";
        let base = WorkingBase::Commit(crate::core::types::Oid::new(oid).unwrap());
        let ws = Workspace::enter(&git, &base, TempBranch::generate()).unwrap();
        ws.release().unwrap();
        assert_eq!(git.call(1), ["checkout", oid, "--"]);
    }
}
