//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **only doorway** to Git. The engine drives a repository
//! exclusively through the [`CommandSurface`] trait; [`Git`] is the production
//! implementation that runs the `git` executable. No other module spawns git
//! or imports `git2`.
//!
//! # Responsibilities
//!
//! - Repository discovery and opening
//! - Running subcommands and capturing exit code, stdout and stderr
//! - Typed wrappers for the operations reconciliation needs (checkout,
//!   commit, cherry-pick, fetch, push, stash, rev-parse, rev-list, diff)
//! - Reading full commit records
//! - Recognizing benign and transient diagnostics ([`Diagnostic`])
//!
//! # Example
//!
//! ```ignore
//! use proposer::git::{CommandSurface, Git};
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! if git.is_dirty(true, &[])? {
//!     println!("working tree has changes");
//! }
//! ```

mod diagnostics;
mod interface;
pub(crate) mod surface;

pub use diagnostics::{classify, Diagnostic, Pattern, Stream, PATTERNS};
pub use interface::{ExecOutput, Git, GitError, RepoInfo};
pub use surface::CommandSurface;
