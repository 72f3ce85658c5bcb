//! git::interface
//!
//! CLI-backed implementation of the [`CommandSurface`].
//!
//! # Architecture
//!
//! The `Git` struct is the production way to interact with a repository.
//! Repository discovery goes through `git2` (so `--cwd` may point anywhere
//! inside a checkout and bare repositories are rejected up front); every
//! history operation is a `git` subprocess run in the working directory.
//! Reconciliation depends on porcelain behavior (cherry-pick strategies,
//! shallow fetches, stash) that only the CLI provides.
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: Not inside a Git repository
//! - [`GitError::BareRepo`]: Repository has no working directory
//! - [`GitError::Spawn`]: The `git` executable could not be started
//! - [`GitError::CommandFailed`]: A subcommand exited non-zero where zero was required
//! - [`GitError::InvalidOutput`]: A subcommand produced output we could not interpret
//!
//! # Example
//!
//! ```ignore
//! use proposer::git::{CommandSurface, Git};
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let head = git.rev_parse("HEAD")?;
//! println!("HEAD is at {}", head.short(7));
//! ```

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::debug;

use super::surface::CommandSurface;
use crate::core::commit::CommitParseError;
use crate::core::types::TypeError;

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// The git executable could not be run.
    #[error("failed to run git {args}: {source}")]
    Spawn {
        args: String,
        #[source]
        source: std::io::Error,
    },

    /// A git subcommand exited non-zero where zero was required.
    #[error("git {args} failed with exit code {code}: {stderr}")]
    CommandFailed {
        /// The arguments passed to git
        args: String,
        /// The process exit code (-1 if killed by a signal)
        code: i32,
        /// Trimmed standard error
        stderr: String,
    },

    /// A git subcommand produced output that could not be interpreted.
    #[error("unexpected output from git {args}: {message}")]
    InvalidOutput { args: String, message: String },

    /// A commit record could not be parsed.
    #[error("could not read commit {reference}: {source}")]
    MalformedCommit {
        reference: String,
        #[source]
        source: CommitParseError,
    },

    /// A value failed strong-type validation.
    #[error(transparent)]
    Type(#[from] TypeError),
}

impl GitError {
    /// The captured stderr, for errors that carry one.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            GitError::CommandFailed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

/// Exit status and captured output of one git invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    /// Whether the command exited zero.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Information about a Git repository.
#[derive(Debug, Clone)]
pub struct RepoInfo {
    /// Path to .git directory
    pub git_dir: PathBuf,
    /// Path to working directory
    pub work_dir: PathBuf,
}

/// The Git command surface backed by the `git` executable.
///
/// # Example
///
/// ```ignore
/// use proposer::git::Git;
/// use std::path::Path;
///
/// let git = Git::open(Path::new("./src"))?;  // Works from subdirectory
/// println!("{}", git.info().work_dir.display());
/// ```
#[derive(Debug, Clone)]
pub struct Git {
    info: RepoInfo,
}

impl Git {
    /// Open a repository at the given path.
    ///
    /// Uses `git2::Repository::discover` to find the repository root,
    /// so `path` can be any directory within the repository.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }

        let work_dir = repo.workdir().ok_or(GitError::BareRepo)?.to_path_buf();
        Ok(Self {
            info: RepoInfo {
                git_dir: repo.path().to_path_buf(),
                work_dir,
            },
        })
    }

    /// Get repository information (git_dir and work_dir paths).
    pub fn info(&self) -> &RepoInfo {
        &self.info
    }

    /// The working directory every command runs in.
    pub fn work_dir(&self) -> &Path {
        &self.info.work_dir
    }
}

impl CommandSurface for Git {
    fn exec(&self, args: &[&str], allow_all_exit_codes: bool) -> Result<ExecOutput, GitError> {
        let joined = args.join(" ");
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.info.work_dir)
            // Diagnostic matching relies on untranslated messages.
            .env("LC_ALL", "C")
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .output()
            .map_err(|source| GitError::Spawn {
                args: joined.clone(),
                source,
            })?;

        let result = ExecOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(args = %joined, exit_code = result.exit_code, "git");

        if !allow_all_exit_codes && !result.success() {
            return Err(GitError::CommandFailed {
                args: joined,
                code: result.exit_code,
                stderr: result.stderr.trim().to_string(),
            });
        }
        Ok(result)
    }
}
