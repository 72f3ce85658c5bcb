//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! There are two configuration scopes, sharing one schema:
//! - **Global**: User-level settings
//! - **Repo**: A checked-in `.proposer.toml` at the working tree root
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$PROPOSER_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/proposer/config.toml`
//! 3. `~/.proposer/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use proposer::core::config::Config;
//! use std::path::Path;
//!
//! let config = Config::load(Some(Path::new("/path/to/repo"))).unwrap();
//! println!("Proposal remote: {}", config.branch_remote());
//! println!("Fetch margin: {}", config.fetch_depth_margin());
//! ```

pub mod schema;

pub use schema::{FileConfig, PushConfig};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// File name of the repo-scope config, relative to the working tree root.
pub const REPO_CONFIG_FILE: &str = ".proposer.toml";

/// Default commit message for uncommitted changes.
pub const DEFAULT_COMMIT_MESSAGE: &str = "[proposer] automated change";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Merged configuration from all sources.
///
/// This struct provides accessor methods that apply precedence rules
/// automatically. Repo config overrides global config.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: FileConfig,
    /// Repository configuration (if the working tree has one)
    pub repo: Option<FileConfig>,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
    /// Path to the repo config file (if loaded)
    repo_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `work_dir` is provided, also loads `<work_dir>/.proposer.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or hold
    /// invalid values. Missing config files are not an error (defaults are
    /// used).
    pub fn load(work_dir: Option<&Path>) -> Result<Self, ConfigError> {
        let global = Self::find_global();
        Self::load_from(global.as_deref(), work_dir)
    }

    /// Load from an explicit global file (if any) and working tree.
    pub fn load_from(global: Option<&Path>, work_dir: Option<&Path>) -> Result<Self, ConfigError> {
        let (global_config, global_path) = match global {
            Some(path) => (Self::read_file(path)?, Some(path.to_path_buf())),
            None => (FileConfig::default(), None),
        };

        let (repo, repo_path) = match work_dir.map(|dir| dir.join(REPO_CONFIG_FILE)) {
            Some(path) if path.exists() => (Some(Self::read_file(&path)?), Some(path)),
            _ => (None, None),
        };

        // Validate loaded configs
        global_config.validate()?;
        if let Some(ref r) = repo {
            r.validate()?;
        }

        debug!(global = ?global_path, repo = ?repo_path, "loaded config");
        Ok(Config {
            global: global_config,
            repo,
            global_path,
            repo_path,
        })
    }

    /// Locate the global config file, if one exists.
    pub fn find_global() -> Option<PathBuf> {
        // 1. Check $PROPOSER_CONFIG
        if let Ok(path) = std::env::var("PROPOSER_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/proposer/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("proposer/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.proposer/config.toml
        dirs::home_dir()
            .map(|home| home.join(".proposer/config.toml"))
            .filter(|path| path.exists())
    }

    /// Read and parse a config file.
    fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// First value set, looking at repo scope before global scope.
    fn pick<'a, T: ?Sized>(
        &'a self,
        key: impl Fn(&'a FileConfig) -> Option<&'a T>,
    ) -> Option<&'a T> {
        self.repo.as_ref().and_then(&key).or_else(|| key(&self.global))
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Remote the base branch is fetched from.
    ///
    /// Defaults to "origin" if not configured.
    pub fn base_remote(&self) -> &str {
        self.pick(|c| c.base_remote.as_deref()).unwrap_or("origin")
    }

    /// Remote holding the proposal branch.
    ///
    /// Defaults to "origin" if not configured.
    pub fn branch_remote(&self) -> &str {
        self.pick(|c| c.branch_remote.as_deref()).unwrap_or("origin")
    }

    /// Remote name treated as a fork.
    ///
    /// Defaults to "fork" if not configured.
    pub fn fork_remote(&self) -> &str {
        self.pick(|c| c.fork_remote.as_deref()).unwrap_or("fork")
    }

    /// Message for the commit of uncommitted changes.
    pub fn commit_message(&self) -> &str {
        self.pick(|c| c.commit_message.as_deref())
            .unwrap_or(DEFAULT_COMMIT_MESSAGE)
    }

    /// Whether to add a Signed-off-by trailer.
    ///
    /// Defaults to `false` if not configured.
    pub fn signoff(&self) -> bool {
        self.pick(|c| c.signoff.as_ref()).copied().unwrap_or(false)
    }

    /// Extra commits fetched beyond the proposal's lead.
    ///
    /// Defaults to 10 if not configured.
    pub fn fetch_depth_margin(&self) -> usize {
        self.pick(|c| c.fetch_depth_margin.as_ref())
            .copied()
            .unwrap_or(10)
    }

    /// Push retry settings, merged key by key across scopes.
    pub fn push(&self) -> PushConfig {
        let global = self.global.push.clone().unwrap_or_default();
        match self.repo.as_ref().and_then(|r| r.push.as_ref()) {
            Some(repo) => global.merged(repo),
            None => global,
        }
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded repo config file.
    pub fn repo_config_loaded_from(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }
}
