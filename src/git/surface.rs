//! git::surface
//!
//! The command surface: the only way the engine touches a repository.
//!
//! # Design
//!
//! Implementors provide a single primitive, [`CommandSurface::exec`], which
//! runs one git subcommand and reports its exit code and output. Every other
//! operation is a provided method layered on top of it, so a test double only
//! has to script `exec`.
//!
//! The engine treats this surface as authoritative. It never opens the
//! metadata directory or inspects the filesystem layout itself.

use super::diagnostics::Diagnostic;
use super::interface::{ExecOutput, GitError};
use crate::core::commit::{Commit, SHOW_FORMAT};
use crate::core::types::Oid;

/// Executes git subcommands against one working directory.
pub trait CommandSurface {
    /// Run `git <args>`.
    ///
    /// With `allow_all_exit_codes` false, a non-zero exit becomes
    /// [`GitError::CommandFailed`]. With it true, the caller receives the
    /// output whatever the exit code and is responsible for checking it.
    fn exec(&self, args: &[&str], allow_all_exit_codes: bool) -> Result<ExecOutput, GitError>;

    // =========================================================================
    // Working tree and branches
    // =========================================================================

    /// Check out `reference`, or with `start_point` create/reset branch
    /// `reference` at `start_point` and check it out (`checkout -B`).
    fn checkout(&self, reference: &str, start_point: Option<&str>) -> Result<(), GitError> {
        let mut args = vec!["checkout"];
        match start_point {
            Some(start) => args.extend(["-B", reference, start]),
            None => args.push(reference),
        }
        args.push("--");
        self.exec(&args, false).map(|_| ())
    }

    /// Hard-reset the current branch to `target`.
    fn reset_hard(&self, target: &str) -> Result<(), GitError> {
        self.exec(&["reset", "--hard", target], false).map(|_| ())
    }

    /// Force-delete a local branch.
    fn delete_branch(&self, name: &str) -> Result<(), GitError> {
        self.exec(&["branch", "--delete", "--force", name], false)
            .map(|_| ())
    }

    /// Stage paths: the given pathspecs, or everything (`-A`) when empty.
    ///
    /// The exit code is not checked; a pathspec matching nothing is benign.
    fn add(&self, paths: &[String]) -> Result<ExecOutput, GitError> {
        let mut args = vec!["add"];
        if paths.is_empty() {
            args.push("-A");
        } else {
            args.push("--");
            args.extend(paths.iter().map(String::as_str));
        }
        self.exec(&args, true)
    }

    /// Run `git commit <options>`.
    fn commit(&self, options: &[&str], allow_all_exit_codes: bool) -> Result<ExecOutput, GitError> {
        let mut args = vec!["commit"];
        args.extend_from_slice(options);
        self.exec(&args, allow_all_exit_codes)
    }

    /// Run `git cherry-pick <options>`.
    fn cherry_pick(
        &self,
        options: &[&str],
        allow_all_exit_codes: bool,
    ) -> Result<ExecOutput, GitError> {
        let mut args = vec!["cherry-pick"];
        args.extend_from_slice(options);
        self.exec(&args, allow_all_exit_codes)
    }

    // =========================================================================
    // Stash
    // =========================================================================

    /// Push a stash entry. Returns whether anything was stashed.
    fn stash_push(&self, options: &[&str]) -> Result<bool, GitError> {
        let mut args = vec!["stash", "push"];
        args.extend_from_slice(options);
        let output = self.exec(&args, false)?;
        Ok(!Diagnostic::NoLocalChangesToSave.matches(&output))
    }

    /// Pop the most recent stash entry.
    fn stash_pop(&self) -> Result<(), GitError> {
        self.exec(&["stash", "pop"], false).map(|_| ())
    }

    // =========================================================================
    // Remotes
    // =========================================================================

    /// Fetch `refspecs` from `remote`.
    fn fetch(&self, refspecs: &[&str], remote: &str, options: &[&str]) -> Result<(), GitError> {
        let mut args = vec![
            "-c",
            "protocol.version=2",
            "fetch",
            "--no-tags",
            "--no-recurse-submodules",
        ];
        args.extend_from_slice(options);
        args.push(remote);
        args.extend_from_slice(refspecs);
        self.exec(&args, false).map(|_| ())
    }

    /// Run `git push <options>`.
    fn push(&self, options: &[&str]) -> Result<ExecOutput, GitError> {
        let mut args = vec!["push"];
        args.extend_from_slice(options);
        self.exec(&args, false)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The short name of the checked-out branch, or `None` when detached.
    fn symbolic_head(&self) -> Result<Option<String>, GitError> {
        let output = self.exec(&["symbolic-ref", "HEAD", "--short"], true)?;
        if output.success() {
            Ok(Some(output.stdout.trim().to_string()))
        } else {
            Ok(None)
        }
    }

    /// Resolve `reference` to a commit id.
    fn rev_parse(&self, reference: &str) -> Result<Oid, GitError> {
        let spec = format!("{reference}^{{commit}}");
        let output = self.exec(&["rev-parse", "--verify", &spec], false)?;
        Ok(Oid::new(output.stdout.trim())?)
    }

    /// Run `git rev-list <options> <expression>` and return trimmed stdout.
    fn rev_list(&self, expression: &[&str], options: &[&str]) -> Result<String, GitError> {
        let mut args = vec!["rev-list"];
        args.extend_from_slice(options);
        args.extend_from_slice(expression);
        let output = self.exec(&args, false)?;
        Ok(output.stdout.trim().to_string())
    }

    /// Run `git status <options>` and return trimmed stdout.
    fn status(&self, options: &[&str]) -> Result<String, GitError> {
        let mut args = vec!["status"];
        args.extend_from_slice(options);
        let output = self.exec(&args, false)?;
        Ok(output.stdout.trim().to_string())
    }

    /// Whether `git diff --quiet <options>` reports a difference.
    fn has_diff(&self, options: &[&str]) -> Result<bool, GitError> {
        let mut args = vec!["diff", "--quiet"];
        args.extend_from_slice(options);
        let output = self.exec(&args, true)?;
        match output.exit_code {
            0 => Ok(false),
            1 => Ok(true),
            code => Err(GitError::CommandFailed {
                args: args.join(" "),
                code,
                stderr: output.stderr.trim().to_string(),
            }),
        }
    }

    /// Whether the working tree has changes, optionally limited to `paths`.
    ///
    /// Checks untracked files (when `include_untracked`), then unstaged
    /// changes, then staged changes.
    fn is_dirty(&self, include_untracked: bool, paths: &[String]) -> Result<bool, GitError> {
        let mut pathspec: Vec<&str> = Vec::new();
        if !paths.is_empty() {
            pathspec.push("--");
            pathspec.extend(paths.iter().map(String::as_str));
        }

        if include_untracked {
            let mut args = vec!["--porcelain", "-unormal"];
            args.extend_from_slice(&pathspec);
            if !self.status(&args)?.is_empty() {
                return Ok(true);
            }
        }

        if self.has_diff(&pathspec)? {
            return Ok(true);
        }

        let mut staged = vec!["--staged"];
        staged.extend_from_slice(&pathspec);
        self.has_diff(&staged)
    }

    /// Fetch the full record for one commit.
    fn get_commit(&self, reference: &str) -> Result<Commit, GitError> {
        let output = self.exec(
            &[
                "-c",
                "core.quotePath=false",
                "show",
                "--raw",
                "--cc",
                "--no-renames",
                "--no-abbrev",
                SHOW_FORMAT,
                reference,
                "--",
            ],
            false,
        )?;
        Commit::parse_show(&output.stdout).map_err(|source| GitError::MalformedCommit {
            reference: reference.to_string(),
            source,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted command surface for unit tests.

    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;

    /// Replays queued outputs and records every invocation.
    #[derive(Default)]
    pub struct ScriptedSurface {
        responses: RefCell<VecDeque<ExecOutput>>,
        pub calls: RefCell<Vec<Vec<String>>>,
    }

    impl ScriptedSurface {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a response with the given exit code and stdout.
        pub fn respond(&self, exit_code: i32, stdout: &str) -> &Self {
            self.respond_full(exit_code, stdout, "")
        }

        pub fn respond_full(&self, exit_code: i32, stdout: &str, stderr: &str) -> &Self {
            self.responses.borrow_mut().push_back(ExecOutput {
                exit_code,
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            });
            self
        }

        pub fn call(&self, index: usize) -> Vec<String> {
            self.calls.borrow()[index].clone()
        }
    }

    impl CommandSurface for ScriptedSurface {
        fn exec(&self, args: &[&str], allow_all_exit_codes: bool) -> Result<ExecOutput, GitError> {
            self.calls
                .borrow_mut()
                .push(args.iter().map(|a| a.to_string()).collect());
            let output = self
                .responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_default();
            if !allow_all_exit_codes && !output.success() {
                return Err(GitError::CommandFailed {
                    args: args.join(" "),
                    code: output.exit_code,
                    stderr: output.stderr,
                });
            }
            Ok(output)
        }
    }
}
