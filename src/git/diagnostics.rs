//! git::diagnostics
//!
//! Translation table for known git diagnostic messages.
//!
//! Some non-zero exits are benign ("nothing to commit" after line-ending
//! normalization, a cherry-pick that became empty) and some are transient
//! (network drops during push). Git reports both only as human-readable
//! text, so recognizing them means string matching. All such matching lives
//! in [`PATTERNS`]; callers ask `Diagnostic::X.matches(&output)` and never
//! inspect message text themselves.
//!
//! Commands are run with `LC_ALL=C` (see [`super::Git`]) so the English
//! messages below are the ones git emits.

use super::interface::ExecOutput;

/// Which output stream a pattern is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
    /// Either stream.
    Any,
}

/// A recognized git outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Diagnostic {
    /// `git commit` found nothing to commit.
    NothingToCommit,
    /// `git cherry-pick` produced no changes on the target.
    CherryPickEmpty,
    /// `git stash push` had nothing to save.
    NoLocalChangesToSave,
    /// A network-level failure talking to a remote.
    TransientNetwork,
}

/// One row of the translation table.
#[derive(Debug, Clone, Copy)]
pub struct Pattern {
    pub diagnostic: Diagnostic,
    pub stream: Stream,
    pub needle: &'static str,
}

const fn row(diagnostic: Diagnostic, stream: Stream, needle: &'static str) -> Pattern {
    Pattern {
        diagnostic,
        stream,
        needle,
    }
}

/// Every diagnostic text the crate recognizes.
pub const PATTERNS: &[Pattern] = &[
    row(
        Diagnostic::NothingToCommit,
        Stream::Stdout,
        "nothing to commit, working tree clean",
    ),
    row(
        Diagnostic::NothingToCommit,
        Stream::Stdout,
        "nothing to commit (working directory clean)",
    ),
    row(
        Diagnostic::NothingToCommit,
        Stream::Stdout,
        "nothing added to commit",
    ),
    row(
        Diagnostic::CherryPickEmpty,
        Stream::Stderr,
        "The previous cherry-pick is now empty, possibly due to conflict resolution.",
    ),
    row(
        Diagnostic::NoLocalChangesToSave,
        Stream::Any,
        "No local changes to save",
    ),
    row(
        Diagnostic::TransientNetwork,
        Stream::Stderr,
        "Could not resolve host",
    ),
    row(
        Diagnostic::TransientNetwork,
        Stream::Stderr,
        "Connection timed out",
    ),
    row(
        Diagnostic::TransientNetwork,
        Stream::Stderr,
        "Connection reset by peer",
    ),
    row(
        Diagnostic::TransientNetwork,
        Stream::Stderr,
        "The remote end hung up unexpectedly",
    ),
    row(Diagnostic::TransientNetwork, Stream::Stderr, "early EOF"),
    row(Diagnostic::TransientNetwork, Stream::Stderr, "RPC failed"),
    row(
        Diagnostic::TransientNetwork,
        Stream::Stderr,
        "Operation timed out",
    ),
];

impl Diagnostic {
    /// Check whether `output` carries this diagnostic.
    ///
    /// # Example
    ///
    /// ```
    /// use proposer::git::{Diagnostic, ExecOutput};
    ///
    /// let output = ExecOutput {
    ///     exit_code: 1,
    ///     stdout: "On branch x\nnothing to commit, working tree clean\n".into(),
    ///     stderr: String::new(),
    /// };
    /// assert!(Diagnostic::NothingToCommit.matches(&output));
    /// assert!(!Diagnostic::CherryPickEmpty.matches(&output));
    /// ```
    pub fn matches(self, output: &ExecOutput) -> bool {
        PATTERNS
            .iter()
            .filter(|p| p.diagnostic == self)
            .any(|p| p.matches_text(&output.stdout, &output.stderr))
    }

    /// Check a bare message, e.g. the stderr carried by an error value.
    pub fn matches_message(self, message: &str) -> bool {
        PATTERNS
            .iter()
            .filter(|p| p.diagnostic == self)
            .any(|p| message.contains(p.needle))
    }
}

impl Pattern {
    fn matches_text(&self, stdout: &str, stderr: &str) -> bool {
        match self.stream {
            Stream::Stdout => stdout.contains(self.needle),
            Stream::Stderr => stderr.contains(self.needle),
            Stream::Any => stdout.contains(self.needle) || stderr.contains(self.needle),
        }
    }
}

/// Return the first diagnostic recognized in `output`, if any.
pub fn classify(output: &ExecOutput) -> Option<Diagnostic> {
    PATTERNS
        .iter()
        .find(|p| p.matches_text(&output.stdout, &output.stderr))
        .map(|p| p.diagnostic)
}
