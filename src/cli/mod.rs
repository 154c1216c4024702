//! Command-line interface for subnet-upgrade.
//!
//! The binary upgrades the checkout a subnet node runs from:
//!
//! ```bash
//! # Track the main branch (same as running with no flags)
//! subnet-upgrade --branch main
//!
//! # Switch to a release
//! subnet-upgrade --tag v1.3.0
//!
//! # Upgrade a checkout elsewhere, with a specific config file
//! subnet-upgrade -C /srv/validator --tag v1.3.0 --config ~/validator.toml
//! ```
//!
//! `--tag` wins over `--branch`. Running for the tag or branch HEAD is already
//! on logs a warning and exits successfully without touching anything.
//!
//! # Logging
//!
//! - default: `info`
//! - `--verbose`: `debug`, including every command line and its output
//! - `--quiet`: errors only
//!
//! `RUST_LOG` directives are applied on top of the chosen level.

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::UpgradeConfig;
use crate::constants::DEFAULT_BRANCH;
use crate::core::UpgradeError;
use crate::process::SystemRunner;
use crate::upgrade::{Target, UpgradeReport, Upgrader};
use crate::utils::{command_exists, get_git_command, resolve_path};

/// Settings derived from the command line before anything runs.
///
/// Kept separate from [`Cli`] so the logging setup can be built and tested
/// without executing an upgrade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Level used when `RUST_LOG` does not say otherwise
    pub log_level: LevelFilter,
    /// Repository working tree, `~` and variables expanded
    pub repo: PathBuf,
    /// Explicit configuration file, if any
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    /// The filter installed by the binary's subscriber.
    #[must_use]
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::builder()
            .with_default_directive(self.log_level.into())
            .from_env_lossy()
    }

    /// Install a fmt subscriber on stderr. Safe to call more than once.
    pub fn init_logging(&self) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(self.env_filter())
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Upgrade a subnet node checkout to a tag or branch.
#[derive(Debug, Parser)]
#[command(
    name = "subnet-upgrade",
    about = "Upgrade a subnet node to a release tag or branch",
    version,
    long_about = "Fetches the requested tag or branch, checks it out and reinstalls the node's \
                  Python dependencies. Does nothing when HEAD is already there."
)]
pub struct Cli {
    /// Release tag to check out (takes priority over --branch)
    #[arg(long, value_name = "TAG")]
    tag: Option<String>,

    /// Branch to track and pull
    #[arg(long, value_name = "BRANCH", default_value = DEFAULT_BRANCH)]
    branch: String,

    /// Repository working tree to upgrade
    #[arg(short = 'C', long, value_name = "PATH", default_value = ".")]
    repo: String,

    /// Configuration file (defaults: <repo>/subnet-upgrade.toml, then the user config dir)
    #[arg(short, long, value_name = "PATH", env = "SUBNET_UPGRADE_CONFIG")]
    config: Option<String>,

    /// Log every command and its output
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    /// Translate flags into a [`CliConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if `--repo` or `--config` cannot be expanded (an
    /// undefined `$VAR`, for instance).
    pub fn build_config(&self) -> Result<CliConfig> {
        let log_level = if self.verbose {
            LevelFilter::DEBUG
        } else if self.quiet {
            LevelFilter::ERROR
        } else {
            LevelFilter::INFO
        };

        Ok(CliConfig {
            log_level,
            repo: resolve_path(&self.repo)?,
            config_path: self.config.as_deref().map(resolve_path).transpose()?,
        })
    }

    /// The requested target, `None` when both `--tag` and `--branch` are empty.
    #[must_use]
    pub fn target(&self) -> Option<Target> {
        Target::from_args(self.tag.as_deref(), Some(self.branch.as_str()))
    }

    /// Run the upgrade with settings from [`build_config`](Self::build_config).
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config()?;
        self.execute_with_config(config).await
    }

    /// Run the upgrade with explicit settings.
    ///
    /// # Errors
    ///
    /// Returns the first failure: configuration, a missing tool, or a failing
    /// git or package-manager command.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        let Some(target) = self.target() else {
            tracing::error!("Nothing to upgrade to: provide a tag or a branch");
            return Ok(());
        };

        let settings = UpgradeConfig::load(config.config_path.as_deref(), &config.repo).await?;
        ensure_tools(&settings)?;

        let upgrader = Upgrader::new(Arc::new(SystemRunner::new()), config.repo.clone(), &settings);
        match upgrader.upgrade(&target).await? {
            UpgradeReport::AlreadyCurrent(_) => {}
            UpgradeReport::Upgraded { from, to, stashed } => {
                if stashed {
                    tracing::info!("Local changes from {from} are in 'git stash list'");
                }
                tracing::info!("{} now on {to}", display_repo(&config.repo));
            }
        }
        Ok(())
    }
}

/// Fail early when git or the package manager is not installed.
fn ensure_tools(settings: &UpgradeConfig) -> Result<()> {
    if !command_exists(get_git_command()) {
        return Err(UpgradeError::GitNotFound.into());
    }
    let program = &settings.dependencies.program;
    if !command_exists(program) {
        return Err(UpgradeError::PackageManagerNotFound {
            program: program.clone(),
        }
        .into());
    }
    Ok(())
}

fn display_repo(repo: &Path) -> String {
    if repo == Path::new(".") {
        "Repository".to_string()
    } else {
        format!("Repository {}", repo.display())
    }
}
