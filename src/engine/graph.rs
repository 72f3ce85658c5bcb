//! engine::graph
//!
//! Graph comparator: where two refs stand relative to each other.
//!
//! # Primitive
//!
//! Everything here reduces to one query: count the commits reachable from
//! one ref but not the other, via `git rev-list --count --left-only|--right-only
//! x...y`. Position is never inferred from commit contents.
//!
//! # Direction
//!
//! All functions take `(x, y)` and answer from `y`'s point of view:
//!
//! | function | meaning |
//! |---|---|
//! | [`commits_ahead`]`(x, y)` | commits in `y` that `x` lacks |
//! | [`commits_behind`]`(x, y)` | commits in `x` that `y` lacks |
//!
//! So `is_ahead(base, branch)` asks "does `branch` have anything `base`
//! does not", which is exactly "does the branch have a diff worth proposing".

use crate::git::{CommandSurface, GitError};

/// Which side of a symmetric difference to count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    /// Reachable from the left ref only.
    Left,
    /// Reachable from the right ref only.
    Right,
}

impl Side {
    fn flag(self) -> &'static str {
        match self {
            Side::Left => "--left-only",
            Side::Right => "--right-only",
        }
    }
}

/// Count commits on one side of `x...y`.
fn count<G: CommandSurface + ?Sized>(
    git: &G,
    x: &str,
    y: &str,
    side: Side,
) -> Result<usize, GitError> {
    let range = format!("{x}...{y}");
    let raw = git.rev_list(&[&range], &[side.flag(), "--count"])?;
    raw.parse::<usize>().map_err(|e| GitError::InvalidOutput {
        args: format!("rev-list {} --count {range}", side.flag()),
        message: format!("expected a commit count, got {raw:?}: {e}"),
    })
}

/// Number of commits `y` has that `x` lacks.
pub fn commits_ahead<G: CommandSurface + ?Sized>(
    git: &G,
    x: &str,
    y: &str,
) -> Result<usize, GitError> {
    count(git, x, y, Side::Right)
}

/// Number of commits `x` has that `y` lacks.
pub fn commits_behind<G: CommandSurface + ?Sized>(
    git: &G,
    x: &str,
    y: &str,
) -> Result<usize, GitError> {
    count(git, x, y, Side::Left)
}

/// Both directions of one comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct AheadBehind {
    /// Commits `y` has that `x` lacks.
    pub ahead: usize,
    /// Commits `x` has that `y` lacks.
    pub behind: usize,
}

impl AheadBehind {
    /// Whether neither side has commits the other lacks.
    pub fn is_even(&self) -> bool {
        self.ahead == 0 && self.behind == 0
    }
}

/// Count both directions of `x...y`.
pub fn ahead_behind<G: CommandSurface + ?Sized>(
    git: &G,
    x: &str,
    y: &str,
) -> Result<AheadBehind, GitError> {
    Ok(AheadBehind {
        ahead: commits_ahead(git, x, y)?,
        behind: commits_behind(git, x, y)?,
    })
}

/// Whether `y` has any commit `x` lacks.
pub fn is_ahead<G: CommandSurface + ?Sized>(git: &G, x: &str, y: &str) -> Result<bool, GitError> {
    Ok(commits_ahead(git, x, y)? > 0)
}

/// Whether `x` has any commit `y` lacks.
pub fn is_behind<G: CommandSurface + ?Sized>(git: &G, x: &str, y: &str) -> Result<bool, GitError> {
    Ok(commits_behind(git, x, y)? > 0)
}

/// Whether neither ref has commits the other lacks.
pub fn is_even<G: CommandSurface + ?Sized>(git: &G, x: &str, y: &str) -> Result<bool, GitError> {
    Ok(!is_ahead(git, x, y)? && !is_behind(git, x, y)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::surface::testing::ScriptedSurface;

    #[test]
    fn ahead_counts_right_side() {
        let git = ScriptedSurface::new();
        git.respond(0, "3\n");
        assert_eq!(commits_ahead(&git, "main", "feature").unwrap(), 3);
        assert_eq!(
            git.call(0),
            ["rev-list", "--right-only", "--count", "main...feature"]
        );
    }

    #[test]
    fn behind_counts_left_side() {
        let git = ScriptedSurface::new();
        git.respond(0, "2\n");
        assert_eq!(commits_behind(&git, "main", "feature").unwrap(), 2);
        assert_eq!(
            git.call(0),
            ["rev-list", "--left-only", "--count", "main...feature"]
        );
    }

    #[test]
    fn boolean_wrappers() {
        let git = ScriptedSurface::new();
        git.respond(0, "0").respond(0, "1");
        assert!(!is_ahead(&git, "a", "b").unwrap());
        assert!(is_behind(&git, "a", "b").unwrap());
    }

    #[test]
    fn even_requires_both_directions_zero() {
        let git = ScriptedSurface::new();
        git.respond(0, "0").respond(0, "0");
        assert!(is_even(&git, "origin/x", "x").unwrap());

        git.respond(0, "0").respond(0, "4");
        assert!(!is_even(&git, "origin/x", "x").unwrap());
    }

    #[test]
    fn even_short_circuits_when_ahead() {
        let git = ScriptedSurface::new();
        git.respond(0, "1");
        assert!(!is_even(&git, "a", "b").unwrap());
        assert_eq!(git.calls.borrow().len(), 1);
    }

    #[test]
    fn ahead_behind_counts_both_sides() {
        let git = ScriptedSurface::new();
        git.respond(0, "2").respond(0, "5");
        let counts = ahead_behind(&git, "main", "feature").unwrap();
        assert_eq!(counts, AheadBehind { ahead: 2, behind: 5 });
        assert!(!counts.is_even());
        assert!(AheadBehind::default().is_even());
        assert_eq!(git.call(1)[1], "--left-only");
    }

    #[test]
    fn unparseable_count_is_an_error() {
        let git = ScriptedSurface::new();
        git.respond(0, "lots");
        assert!(matches!(
            commits_ahead(&git, "a", "b"),
            Err(GitError::InvalidOutput { .. })
        ));
    }

    #[test]
    fn failed_rev_list_propagates() {
        let git = ScriptedSurface::new();
        git.respond_full(128, "", "fatal: ambiguous argument 'a...b'");
        assert!(matches!(
            commits_ahead(&git, "a", "b"),
            Err(GitError::CommandFailed { code: 128, .. })
        ));
    }
}
