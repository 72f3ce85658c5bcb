//! Property-based tests for core domain types and commit parsing.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use proptest::prelude::*;

use proposer::core::commit::{ChangeStatus, FileChange};
use proposer::core::types::{BranchName, Oid, RemoteName};

/// Strategy for generating valid branch name characters.
fn branch_name_char() -> impl Strategy<Value = char> {
    prop_oneof![
        prop::char::range('a', 'z'),
        prop::char::range('A', 'Z'),
        prop::char::range('0', '9'),
        Just('-'),
        Just('_'),
        Just('.'),
        Just('/'),
    ]
}

/// Strategy for generating valid branch names.
fn valid_branch_name() -> impl Strategy<Value = String> {
    prop::collection::vec(branch_name_char(), 1..50).prop_filter_map(
        "must be valid branch name",
        |chars| {
            let name: String = chars.into_iter().collect();
            if name.starts_with('-')
                || name.ends_with('/')
                || name.contains("..")
                || name.contains("//")
                || name
                    .split('/')
                    .any(|c| c.starts_with('.') || c.ends_with(".lock"))
            {
                None
            } else {
                Some(name)
            }
        },
    )
}

/// Strategy for generating valid hex OIDs.
fn valid_oid_string() -> impl Strategy<Value = String> {
    "[0-9a-f]{40}"
}

/// Strategy for `git show --raw` file modes.
fn mode() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["100644", "100755", "120000", "160000"]).prop_map(String::from)
}

/// Strategy for paths git would print unquoted: no tabs or newlines, and
/// never blank.
fn path() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_. /-]{0,40}[a-zA-Z0-9_]"
}

proptest! {
    /// Any valid branch name round-trips through serde.
    #[test]
    fn branch_name_serde_roundtrip(name in valid_branch_name()) {
        let branch = BranchName::new(&name).unwrap();
        let json = serde_json::to_string(&branch).unwrap();
        let parsed: BranchName = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(branch, parsed);
    }

    /// Names containing a forbidden sequence are always rejected.
    #[test]
    fn forbidden_sequences_rejected(
        prefix in "[a-z]{1,10}",
        forbidden in prop::sample::select(vec![
            "..", "@{", "//", " ", "~", "^", ":", "?", "*", "[",
        ]),
        suffix in "[a-z]{1,10}",
    ) {
        let name = format!("{prefix}{forbidden}{suffix}");
        prop_assert!(BranchName::new(name).is_err());
    }

    /// Remote names never contain a slash.
    #[test]
    fn remote_names_reject_slashes(a in "[a-z]{1,10}", b in "[a-z]{1,10}") {
        prop_assert!(RemoteName::new(a.clone()).is_ok());
        let joined = format!("{a}/{b}");
        prop_assert!(RemoteName::new(joined).is_err());
    }

    /// OIDs are normalized to lowercase.
    #[test]
    fn oid_normalized_to_lowercase(oid_str in valid_oid_string()) {
        let upper = oid_str.to_uppercase();
        let oid = Oid::new(&upper).unwrap();
        prop_assert_eq!(oid.as_str(), oid_str);
    }

    /// Oid::short returns correct prefix.
    #[test]
    fn oid_short_is_prefix(oid_str in valid_oid_string(), len in 1usize..60) {
        let oid = Oid::new(&oid_str).unwrap();
        let short = oid.short(len);
        prop_assert!(oid_str.starts_with(short));
        prop_assert_eq!(short.len(), len.min(40));
    }

    /// Arbitrary input never panics the change-line parser.
    #[test]
    fn parse_raw_never_panics(line in "\\PC{0,120}") {
        let _ = FileChange::parse_raw(&line);
        let _ = FileChange::parse_raw(&format!(":{line}"));
    }

    /// Well-formed add, modify, and delete lines parse with the path intact.
    #[test]
    fn well_formed_lines_parse(
        src_mode in mode(),
        dst_mode in mode(),
        src in valid_oid_string(),
        dst in valid_oid_string(),
        status in prop::sample::select(vec!['A', 'M', 'D']),
        path in path(),
    ) {
        let line = format!(":{src_mode} {dst_mode} {src} {dst} {status}\t{path}");
        let change = FileChange::parse_raw(&line).unwrap();

        prop_assert_eq!(change.status.code(), status);
        prop_assert_eq!(&change.path, &path);
        prop_assert_eq!(change.dst_oid.as_str(), dst.as_str());
        let expected_mode = if change.status == ChangeStatus::Deleted {
            &src_mode
        } else {
            &dst_mode
        };
        prop_assert_eq!(&change.mode, expected_mode);
    }

    /// Renames and copies are never mistaken for plain changes.
    #[test]
    fn renames_and_copies_rejected(
        src in valid_oid_string(),
        dst in valid_oid_string(),
        status in prop::sample::select(vec!["R100", "C075", "T", "U", "X"]),
        path in path(),
    ) {
        let line = format!(":100644 100644 {src} {dst} {status}\t{path}\t{path}.new");
        prop_assert!(FileChange::parse_raw(&line).is_none());
    }
}
