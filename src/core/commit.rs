//! core::commit
//!
//! The commit model handed to downstream publishers.
//!
//! # Record Format
//!
//! A [`Commit`] is built from a single `git show --raw` invocation whose
//! header is produced by [`SHOW_FORMAT`]:
//!
//! ```text
//! <commit id>
//! <tree id>
//! <parent ids, space separated>
//! <signature status, %G?>
//! <subject>
//! <body, possibly multi-line>
//! ###EOB###
//!
//! :100644 100644 <src id> <dst id> M\tpath/to/file
//! ```
//!
//! # Degradation
//!
//! Change lines that do not match the expected shape (renames, type changes,
//! combined merge records) never fail parsing. They are kept verbatim in
//! [`Commit::unparsed_changes`] so the caller can warn about them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{Oid, TypeError};

/// Marker terminating the free-form body in the `git show` header.
pub const END_OF_BODY: &str = "###EOB###";

/// `--format` argument producing the header [`Commit::parse_show`] expects.
pub const SHOW_FORMAT: &str = "--format=%H%n%T%n%P%n%G?%n%s%n%b%n###EOB###";

/// Errors from parsing a commit record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommitParseError {
    #[error("commit record is missing the end-of-body marker")]
    MissingEndOfBody,

    #[error("commit record is missing the {0} line")]
    MissingField(&'static str),

    #[error("commit record has an invalid {field}: {source}")]
    InvalidOid {
        field: &'static str,
        #[source]
        source: TypeError,
    },
}

/// How a file changed in a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    Added,
    Modified,
    Deleted,
}

impl ChangeStatus {
    /// Map a raw status letter. Anything other than `A`, `M`, `D` is unknown.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "A" => Some(ChangeStatus::Added),
            "M" => Some(ChangeStatus::Modified),
            "D" => Some(ChangeStatus::Deleted),
            _ => None,
        }
    }

    /// The raw status letter.
    pub fn code(&self) -> char {
        match self {
            ChangeStatus::Added => 'A',
            ChangeStatus::Modified => 'M',
            ChangeStatus::Deleted => 'D',
        }
    }
}

/// One file-level change in a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Path relative to the repository root.
    pub path: String,
    /// Six-digit octal file mode. For deletions this is the mode the file
    /// had before it was removed.
    pub mode: String,
    /// Added, modified, or deleted.
    pub status: ChangeStatus,
    /// Object id of the resulting content (all zeros for deletions).
    pub dst_oid: Oid,
}

impl FileChange {
    /// Parse one `--raw` change line.
    ///
    /// Accepts `:<mode> <mode> <oid> <oid> <A|M|D>\t<path>` and returns
    /// `None` for anything else. Everything after the tab is the path.
    ///
    /// # Example
    ///
    /// ```
    /// use proposer::core::commit::{ChangeStatus, FileChange};
    ///
    /// let line = ":100644 100644 1111111111111111111111111111111111111111 \
    ///             2222222222222222222222222222222222222222 M\tsrc/lib.rs";
    /// let change = FileChange::parse_raw(line).unwrap();
    /// assert_eq!(change.path, "src/lib.rs");
    /// assert_eq!(change.status, ChangeStatus::Modified);
    ///
    /// assert!(FileChange::parse_raw(":100644 100644 aaa bbb R100\ta\tb").is_none());
    /// ```
    pub fn parse_raw(line: &str) -> Option<Self> {
        let rest = line.strip_prefix(':')?;
        let mut fields = rest.splitn(5, ' ');
        let src_mode = fields.next()?;
        let dst_mode = fields.next()?;
        let src_oid = fields.next()?;
        let dst_oid = fields.next()?;
        let tail = fields.next()?;

        if !is_mode(src_mode) || !is_mode(dst_mode) {
            return None;
        }
        Oid::new(src_oid).ok()?;
        let dst_oid = Oid::new(dst_oid).ok()?;

        let (code, path) = tail.split_once('\t')?;
        let status = ChangeStatus::from_code(code)?;
        if path.is_empty() {
            return None;
        }

        let mode = if status == ChangeStatus::Deleted {
            src_mode
        } else {
            dst_mode
        };

        Some(FileChange {
            path: path.to_string(),
            mode: mode.to_string(),
            status,
            dst_oid,
        })
    }
}

fn is_mode(field: &str) -> bool {
    field.len() == 6 && field.bytes().all(|b| b.is_ascii_digit())
}

/// A fully described commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub id: Oid,
    pub tree: Oid,
    /// Parent ids in order. Empty for a root commit.
    pub parents: Vec<Oid>,
    /// Whether the commit carries any signature (`%G?` other than `N`).
    pub signed: bool,
    pub subject: String,
    pub body: String,
    /// Typed file changes, in the order git reported them.
    pub changes: Vec<FileChange>,
    /// Raw change lines that could not be typed.
    pub unparsed_changes: Vec<String>,
}

impl Commit {
    /// Parse the output of `git show --raw` run with [`SHOW_FORMAT`].
    ///
    /// # Errors
    ///
    /// - [`CommitParseError::MissingEndOfBody`] if the marker is absent
    /// - [`CommitParseError::MissingField`] if a header line is absent
    /// - [`CommitParseError::InvalidOid`] if the id, tree or a parent is malformed
    pub fn parse_show(output: &str) -> Result<Self, CommitParseError> {
        let lines: Vec<&str> = output
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .collect();
        let eob = lines
            .iter()
            .rposition(|l| *l == END_OF_BODY)
            .ok_or(CommitParseError::MissingEndOfBody)?;
        let header = &lines[..eob];

        let field = |index: usize, name: &'static str| {
            header
                .get(index)
                .copied()
                .ok_or(CommitParseError::MissingField(name))
        };
        let oid = |value: &str, name: &'static str| {
            Oid::new(value).map_err(|source| CommitParseError::InvalidOid {
                field: name,
                source,
            })
        };

        let id = oid(field(0, "commit id")?, "commit id")?;
        let tree = oid(field(1, "tree id")?, "tree id")?;
        let parents = field(2, "parents")?
            .split_whitespace()
            .map(|p| oid(p, "parent id"))
            .collect::<Result<Vec<_>, _>>()?;
        let signed = field(3, "signature status")? != "N";
        let subject = field(4, "subject")?.to_string();
        let body = header
            .get(5..)
            .map(|rest| rest.join("\n"))
            .unwrap_or_default()
            .trim_end_matches('\n')
            .to_string();

        let mut changes = Vec::new();
        let mut unparsed_changes = Vec::new();
        for line in lines[eob + 1..].iter().filter(|l| !l.trim().is_empty()) {
            match FileChange::parse_raw(line) {
                Some(change) => changes.push(change),
                None => unparsed_changes.push((*line).to_string()),
            }
        }

        Ok(Commit {
            id,
            tree,
            parents,
            signed,
            subject,
            body,
            changes,
            unparsed_changes,
        })
    }

    /// A commit that changes no files. Its tree equals its first parent's.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.unparsed_changes.is_empty()
    }

    /// The full commit message (subject, blank line, body).
    pub fn message(&self) -> String {
        if self.body.is_empty() {
            self.subject.clone()
        } else {
            format!("{}\n\n{}", self.subject, self.body)
        }
    }
}
