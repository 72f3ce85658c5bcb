//! core::config::schema
//!
//! Configuration schema types.
//!
//! Global and repo files share one schema, [`FileConfig`]; every key is
//! optional so that a repo file can override just the keys it names.
//!
//! # Validation
//!
//! Config values are validated after parsing: remote names must be valid
//! remote names, the fetch depth margin and attempt budget must be at
//! least 1, and the backoff cap must not be below the initial backoff.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::RemoteName;

/// One configuration file (global or repo scope).
///
/// # Example
///
/// ```toml
/// base_remote = "origin"
/// branch_remote = "fork"
/// fork_remote = "fork"
/// commit_message = "[bot] update dependencies"
/// signoff = true
/// fetch_depth_margin = 10
///
/// [push]
/// max_attempts = 3
/// initial_backoff_ms = 1000
/// max_backoff_ms = 10000
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Remote the base branch is fetched from (default: "origin")
    pub base_remote: Option<String>,

    /// Remote holding the proposal branch (default: "origin")
    pub branch_remote: Option<String>,

    /// Remote name treated as a fork (default: "fork")
    pub fork_remote: Option<String>,

    /// Message for the commit of uncommitted changes
    pub commit_message: Option<String>,

    /// Add a Signed-off-by trailer (default: false)
    pub signoff: Option<bool>,

    /// Extra commits fetched beyond the proposal's lead (default: 10)
    pub fetch_depth_margin: Option<usize>,

    /// Push retry settings
    pub push: Option<PushConfig>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("base_remote", &self.base_remote),
            ("branch_remote", &self.branch_remote),
            ("fork_remote", &self.fork_remote),
        ] {
            if let Some(name) = value {
                RemoteName::new(name.as_str()).map_err(|e| {
                    ConfigError::InvalidValue(format!("invalid {key}: {e}"))
                })?;
            }
        }

        if let Some(message) = &self.commit_message {
            if message.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "commit_message cannot be empty".to_string(),
                ));
            }
        }

        if self.fetch_depth_margin == Some(0) {
            return Err(ConfigError::InvalidValue(
                "fetch_depth_margin must be at least 1".to_string(),
            ));
        }

        if let Some(push) = &self.push {
            push.validate()?;
        }

        Ok(())
    }
}

/// Push retry settings (`[push]` table).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PushConfig {
    /// Total push attempts including the first (default: 3)
    pub max_attempts: Option<u32>,

    /// Delay before the first retry, in milliseconds (default: 1000)
    pub initial_backoff_ms: Option<u64>,

    /// Cap on any single delay, in milliseconds (default: 10000)
    pub max_backoff_ms: Option<u64>,
}

impl PushConfig {
    /// Total push attempts.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts.unwrap_or(3)
    }

    /// Initial backoff in milliseconds.
    pub fn initial_backoff_ms(&self) -> u64 {
        self.initial_backoff_ms.unwrap_or(1000)
    }

    /// Backoff cap in milliseconds.
    pub fn max_backoff_ms(&self) -> u64 {
        self.max_backoff_ms.unwrap_or(10_000)
    }

    /// Overlay `other` on `self`: keys set in `other` win.
    pub fn merged(&self, other: &PushConfig) -> PushConfig {
        PushConfig {
            max_attempts: other.max_attempts.or(self.max_attempts),
            initial_backoff_ms: other.initial_backoff_ms.or(self.initial_backoff_ms),
            max_backoff_ms: other.max_backoff_ms.or(self.max_backoff_ms),
        }
    }

    /// Validate the push settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == Some(0) {
            return Err(ConfigError::InvalidValue(
                "push.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.max_backoff_ms() < self.initial_backoff_ms() {
            return Err(ConfigError::InvalidValue(format!(
                "push.max_backoff_ms ({}) is below push.initial_backoff_ms ({})",
                self.max_backoff_ms(),
                self.initial_backoff_ms()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod file_config {
        use super::*;

        #[test]
        fn defaults() {
            let config = FileConfig::default();
            assert!(config.base_remote.is_none());
            assert!(config.push.is_none());
            assert!(config.validate().is_ok());
        }

        #[test]
        fn parses_all_keys() {
            let config: FileConfig = toml::from_str(
                r#"
                base_remote = "upstream"
                branch_remote = "fork"
                fork_remote = "fork"
                commit_message = "[bot] bump"
                signoff = true
                fetch_depth_margin = 5

                [push]
                max_attempts = 4
                "#,
            )
            .unwrap();
            assert_eq!(config.base_remote.as_deref(), Some("upstream"));
            assert_eq!(config.fetch_depth_margin, Some(5));
            assert_eq!(config.push.as_ref().unwrap().max_attempts(), 4);
            assert!(config.validate().is_ok());
        }

        #[test]
        fn invalid_remote_rejected() {
            let config = FileConfig {
                branch_remote: Some("a/b".into()),
                ..Default::default()
            };
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("branch_remote"));
        }

        #[test]
        fn zero_margin_rejected() {
            let config = FileConfig {
                fetch_depth_margin: Some(0),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn blank_message_rejected() {
            let config = FileConfig {
                commit_message: Some("  ".into()),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn reject_unknown_fields() {
            let parsed: Result<FileConfig, _> = toml::from_str("trunk = \"main\"");
            assert!(parsed.is_err());

            let parsed: Result<FileConfig, _> = toml::from_str("[push]\nretries = 2");
            assert!(parsed.is_err());
        }

        #[test]
        fn roundtrip() {
            let config = FileConfig {
                branch_remote: Some("fork".into()),
                signoff: Some(true),
                push: Some(PushConfig {
                    max_attempts: Some(2),
                    ..Default::default()
                }),
                ..Default::default()
            };
            let text = toml::to_string(&config).unwrap();
            let parsed: FileConfig = toml::from_str(&text).unwrap();
            assert_eq!(parsed, config);
        }
    }

    mod push_config {
        use super::*;

        #[test]
        fn defaults() {
            let push = PushConfig::default();
            assert_eq!(push.max_attempts(), 3);
            assert_eq!(push.initial_backoff_ms(), 1000);
            assert_eq!(push.max_backoff_ms(), 10_000);
        }

        #[test]
        fn zero_attempts_rejected() {
            let push = PushConfig {
                max_attempts: Some(0),
                ..Default::default()
            };
            assert!(push.validate().is_err());
        }

        #[test]
        fn inverted_backoff_rejected() {
            let push = PushConfig {
                initial_backoff_ms: Some(5000),
                max_backoff_ms: Some(100),
                ..Default::default()
            };
            assert!(push.validate().is_err());
        }

        #[test]
        fn merge_prefers_overlay() {
            let global = PushConfig {
                max_attempts: Some(5),
                initial_backoff_ms: Some(200),
                ..Default::default()
            };
            let repo = PushConfig {
                max_attempts: Some(1),
                ..Default::default()
            };
            let merged = global.merged(&repo);
            assert_eq!(merged.max_attempts(), 1);
            assert_eq!(merged.initial_backoff_ms(), 200);
            assert_eq!(merged.max_backoff_ms(), 10_000);
        }
    }
}
