//! Upgrade configuration.
//!
//! Everything has a default, so a node with no configuration file upgrades
//! with `git` against `origin` and `pip install -r requirements.txt`. A TOML
//! file can override any of it:
//!
//! ```toml
//! [git]
//! remote = "upstream"
//! timeout_secs = 120
//! stash_local_changes = true
//!
//! [dependencies]
//! program = "python3"
//! prefix_args = ["-m", "pip"]
//! requirements = "requirements/prod.txt"
//! editable = true
//! timeout_secs = 900
//! ```
//!
//! # Lookup order
//!
//! 1. An explicit path (`--config` or `SUBNET_UPGRADE_CONFIG`); it must exist
//! 2. `subnet-upgrade.toml` in the repository being upgraded
//! 3. `<user config dir>/subnet-upgrade/config.toml`
//! 4. Built-in defaults

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::constants::{
    CONFIG_FILE_NAME, DEFAULT_PACKAGE_MANAGER, DEFAULT_REMOTE, DEFAULT_REQUIREMENTS_FILE,
    GIT_TIMEOUT_SECS, PACKAGE_MANAGER_TIMEOUT_SECS,
};
use crate::core::UpgradeError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpgradeConfig {
    /// Source-control settings
    #[serde(default)]
    pub git: GitConfig,

    /// Dependency installation settings
    #[serde(default)]
    pub dependencies: DependencyConfig,
}

/// `[git]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GitConfig {
    /// Remote to fetch tags from and to track branches on
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Timeout for each git command in seconds; `0` waits forever
    #[serde(default = "default_git_timeout")]
    pub timeout_secs: u64,

    /// Stash uncommitted changes before switching versions
    #[serde(default = "default_true")]
    pub stash_local_changes: bool,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            remote: default_remote(),
            timeout_secs: default_git_timeout(),
            stash_local_changes: true,
        }
    }
}

impl GitConfig {
    /// Per-command timeout, `None` when disabled.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        timeout_from_secs(self.timeout_secs)
    }
}

/// `[dependencies]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependencyConfig {
    /// Package manager executable
    #[serde(default = "default_package_manager")]
    pub program: String,

    /// Arguments placed before every subcommand (e.g. `["-m", "pip"]`)
    #[serde(default)]
    pub prefix_args: Vec<String>,

    /// Requirements file, relative to the repository root
    #[serde(default = "default_requirements")]
    pub requirements: String,

    /// Reinstall the checkout itself in editable mode after the requirements
    #[serde(default = "default_true")]
    pub editable: bool,

    /// Timeout for each install command in seconds; `0` waits forever
    #[serde(default = "default_package_manager_timeout")]
    pub timeout_secs: u64,
}

impl Default for DependencyConfig {
    fn default() -> Self {
        Self {
            program: default_package_manager(),
            prefix_args: Vec::new(),
            requirements: default_requirements(),
            editable: true,
            timeout_secs: default_package_manager_timeout(),
        }
    }
}

impl DependencyConfig {
    /// Per-command timeout, `None` when disabled.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        timeout_from_secs(self.timeout_secs)
    }
}

const fn timeout_from_secs(secs: u64) -> Option<Duration> {
    if secs == 0 {
        None
    } else {
        Some(Duration::from_secs(secs))
    }
}

fn default_remote() -> String {
    DEFAULT_REMOTE.to_string()
}

fn default_package_manager() -> String {
    DEFAULT_PACKAGE_MANAGER.to_string()
}

fn default_requirements() -> String {
    DEFAULT_REQUIREMENTS_FILE.to_string()
}

const fn default_git_timeout() -> u64 {
    GIT_TIMEOUT_SECS
}

const fn default_package_manager_timeout() -> u64 {
    PACKAGE_MANAGER_TIMEOUT_SECS
}

const fn default_true() -> bool {
    true
}

impl UpgradeConfig {
    /// Load configuration following the documented lookup order.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit path does not exist, or if the file
    /// that was found cannot be read, parsed or validated.
    pub async fn load(explicit: Option<&Path>, repo: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(UpgradeError::ConfigError {
                    message: format!("config file {} does not exist", path.display()),
                }
                .into());
            }
            return Self::load_from(path).await;
        }

        for candidate in Self::candidate_paths(repo) {
            if candidate.exists() {
                return Self::load_from(&candidate).await;
            }
        }

        tracing::debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Files probed when no explicit path is given, in order.
    #[must_use]
    pub fn candidate_paths(repo: &Path) -> Vec<PathBuf> {
        let mut paths = vec![repo.join(CONFIG_FILE_NAME)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("subnet-upgrade").join("config.toml"));
        }
        paths
    }

    /// Load and validate the configuration at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, has
    /// unknown keys, or fails [`validate`](Self::validate).
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(UpgradeError::from)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .map_err(UpgradeError::from)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        config.validate()?;

        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Reject values that would produce broken command lines.
    ///
    /// # Errors
    ///
    /// Returns [`UpgradeError::ConfigError`] describing the first bad value.
    pub fn validate(&self) -> Result<()> {
        let bad = |message: &str| -> Result<()> {
            Err(UpgradeError::ConfigError {
                message: message.to_string(),
            }
            .into())
        };

        if self.git.remote.trim().is_empty() || self.git.remote.starts_with('-') {
            return bad("git.remote must be a remote name such as 'origin'");
        }
        if self.dependencies.program.trim().is_empty() {
            return bad("dependencies.program must not be empty");
        }
        if self.dependencies.requirements.trim().is_empty() {
            return bad("dependencies.requirements must not be empty");
        }
        Ok(())
    }
}
