//! Integration tests for the proposer binary.
//!
//! These tests run the built CLI against real repositories and check its
//! exit status, stdout, and stderr. Config lookup is pinned to the temp
//! directory so a developer's own config never leaks in.

use std::path::Path;
use std::process::Command as StdCommand;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// =============================================================================
// Test Fixtures
// =============================================================================

/// A bare origin with one commit on `main` and a clone to run in.
struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let root = dir.path();

        run_git(root, &["init", "--bare", "origin.git"]);
        run_git(&root.join("origin.git"), &["symbolic-ref", "HEAD", "refs/heads/main"]);

        let url = format!("file://{}", root.join("origin.git").display());
        run_git(root, &["clone", "--quiet", &url, "work"]);
        let work = root.join("work");
        run_git(&work, &["config", "user.email", "test@example.com"]);
        run_git(&work, &["config", "user.name", "Test User"]);
        run_git(&work, &["config", "commit.gpgsign", "false"]);
        run_git(&work, &["checkout", "-b", "main"]);
        std::fs::write(work.join("README.md"), "# Test Repo\n").unwrap();
        run_git(&work, &["add", "README.md"]);
        run_git(&work, &["commit", "-m", "Initial commit"]);
        run_git(&work, &["push", "--quiet", "-u", "origin", "main"]);

        Self { dir }
    }

    fn work(&self) -> std::path::PathBuf {
        self.dir.path().join("work")
    }

    fn origin(&self) -> std::path::PathBuf {
        self.dir.path().join("origin.git")
    }

    /// The binary, run inside the working clone.
    fn proposer(&self) -> Command {
        let mut cmd = proposer(self.dir.path());
        cmd.current_dir(self.work());
        cmd
    }
}

/// The binary with config lookup isolated under `home`.
fn proposer(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("proposer").unwrap();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("xdg"))
        .env("PROPOSER_CONFIG", home.join("no-such-config.toml"))
        .env_remove("PROPOSER_LOG");
    cmd
}

fn run_git(dir: &Path, args: &[&str]) -> String {
    let output = StdCommand::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git command failed");

    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

// =============================================================================
// Global behavior
// =============================================================================

#[test]
fn help_flag_works() {
    let home = TempDir::new().unwrap();
    proposer(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("reconcile"))
        .stdout(predicate::str::contains("commits"));
}

#[test]
fn version_flag_works() {
    let home = TempDir::new().unwrap();
    proposer(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("proposer"));
}

#[test]
fn completion_generates_script() {
    let home = TempDir::new().unwrap();
    proposer(home.path())
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("proposer"));
}

#[test]
fn invalid_branch_is_a_usage_error() {
    let home = TempDir::new().unwrap();
    proposer(home.path())
        .args(["reconcile", "--branch", "a..b"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'..'"));
}

#[test]
fn outside_a_repository_fails_cleanly() {
    let home = TempDir::new().unwrap();
    proposer(home.path())
        .current_dir(home.path())
        .args(["reconcile", "--branch", "bot/x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open repository"));
}

// =============================================================================
// reconcile
// =============================================================================

#[test]
fn reconcile_without_changes_reports_none() {
    let repo = TestRepo::new();
    repo.proposer()
        .args(["reconcile", "--branch", "bot/x"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("bot/x: none"));
}

#[test]
fn reconcile_json_reports_created() {
    let repo = TestRepo::new();
    std::fs::write(repo.work().join("new.txt"), "new\n").unwrap();

    repo.proposer()
        .args(["reconcile", "--branch", "bot/x", "--json", "-m", "Add new.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""action": "created""#))
        .stdout(predicate::str::contains(r#""has_diff_with_base": true"#))
        .stdout(predicate::str::contains(r#""pushed": false"#))
        .stdout(predicate::str::contains("Add new.txt"));

    assert_eq!(run_git(&repo.work(), &["log", "-1", "--format=%s", "bot/x"]), "Add new.txt");
}

#[test]
fn reconcile_push_publishes_branch() {
    let repo = TestRepo::new();
    std::fs::write(repo.work().join("new.txt"), "new\n").unwrap();

    repo.proposer()
        .args(["reconcile", "--branch", "bot/x", "--push", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""pushed": true"#));

    let local = run_git(&repo.work(), &["rev-parse", "bot/x"]);
    let remote = run_git(&repo.origin(), &["rev-parse", "refs/heads/bot/x"]);
    assert_eq!(local, remote);

    // The same content again is not pushed.
    std::fs::write(repo.work().join("new.txt"), "new\n").unwrap();
    repo.proposer()
        .args(["reconcile", "--branch", "bot/x", "--push", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""action": "not-updated""#))
        .stdout(predicate::str::contains(r#""pushed": false"#));
}

#[test]
fn reconcile_uses_repo_config_message() {
    let repo = TestRepo::new();
    std::fs::write(
        repo.work().join(".proposer.toml"),
        "commit_message = \"[bot] refresh\"\nsignoff = true\n",
    )
    .unwrap();

    repo.proposer()
        .args(["reconcile", "--branch", "bot/x", "-q"])
        .assert()
        .success()
        .stdout(predicate::str::diff("bot/x: created\n"));

    let body = run_git(&repo.work(), &["log", "-1", "--format=%B", "bot/x"]);
    assert!(body.starts_with("[bot] refresh"));
    assert!(body.contains("Signed-off-by: Test User <test@example.com>"));
}

#[test]
fn reconcile_rejects_bad_config() {
    let repo = TestRepo::new();
    std::fs::write(repo.work().join(".proposer.toml"), "fetch_depth_margin = 0\n").unwrap();

    repo.proposer()
        .args(["reconcile", "--branch", "bot/x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn reconcile_onto_itself_is_rejected() {
    let repo = TestRepo::new();
    repo.proposer()
        .args(["reconcile", "--branch", "main"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must differ from base"));
}

// =============================================================================
// commits
// =============================================================================

#[test]
fn commits_lists_branch_commits() {
    let repo = TestRepo::new();
    std::fs::write(repo.work().join("new.txt"), "new\n").unwrap();
    repo.proposer()
        .args(["reconcile", "--branch", "bot/x", "-m", "Add new.txt"])
        .assert()
        .success();

    repo.proposer()
        .args(["commits", "--base", "main", "--branch", "bot/x"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bot/x: 1 ahead of main, 0 behind"))
        .stdout(predicate::str::contains("Add new.txt (1 file(s))"));

    repo.proposer()
        .args(["commits", "--base", "main", "--branch", "bot/x", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""ahead": 1"#))
        .stdout(predicate::str::contains(r#""path": "new.txt""#))
        .stdout(predicate::str::contains(r#""status": "added""#));
}
