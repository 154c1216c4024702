//! Version-control façade for a running node.
//!
//! A node that learns a new release is available calls
//! [`VersionControl::upgrade_subnet`] with the bare version (`"1.3.0"`); the
//! façade checks out tag `v1.3.0` and reinstalls dependencies. Failures are
//! logged and returned as an [`UpgradeOutcome`], never propagated, so the
//! caller's event loop keeps running whatever happens.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use subnet_upgrade::config::UpgradeConfig;
//! use subnet_upgrade::version::{UpgradeState, VersionControl};
//!
//! # async fn example() {
//! let state = Arc::new(UpgradeState::new());
//! let control = VersionControl::from_config("/srv/node", &UpgradeConfig::default(), state);
//!
//! if control.state().try_begin() {
//!     let outcome = control.upgrade_subnet("1.3.0").await;
//!     control.state().set_must_restart(outcome.is_success());
//!     control.state().set_upgrading(false);
//! }
//! # }
//! ```

pub mod state;

pub use state::UpgradeState;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::UpgradeConfig;
use crate::constants::TAG_PREFIX;
use crate::deps::{DependencyManager, PipInstaller};
use crate::git::{GitRepository, SourceControl};
use crate::process::SystemRunner;

/// Which step of a façade call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Fetching or checking out the tag
    SourceControl,
    /// Reinstalling dependencies
    Dependencies,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceControl => f.write_str("source control"),
            Self::Dependencies => f.write_str("dependencies"),
        }
    }
}

/// Result of [`VersionControl::upgrade_subnet`] or [`VersionControl::downgrade_subnet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeOutcome {
    /// The version is checked out and its dependencies installed
    Completed {
        /// Version as requested, without the tag prefix
        version: String,
    },
    /// A step failed; later steps did not run
    Failed {
        /// The step that failed
        kind: FailureKind,
        /// Full error chain
        message: String,
    },
}

impl UpgradeOutcome {
    /// `true` for [`UpgradeOutcome::Completed`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Upgrade,
    Downgrade,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upgrade => f.write_str("upgrade"),
            Self::Downgrade => f.write_str("downgrade"),
        }
    }
}

/// Switches the node to a released version through a source-control and a
/// dependency helper.
#[derive(Debug)]
pub struct VersionControl<S, D> {
    source: S,
    deps: D,
    state: Arc<UpgradeState>,
}

impl VersionControl<GitRepository<SystemRunner>, PipInstaller<SystemRunner>> {
    /// Façade over the checkout at `path` using real git and pip.
    pub fn from_config(path: impl Into<PathBuf>, config: &UpgradeConfig, state: Arc<UpgradeState>) -> Self {
        let path = path.into();
        let runner = Arc::new(SystemRunner::new());
        Self::new(
            GitRepository::new(Arc::clone(&runner), path.clone(), &config.git),
            PipInstaller::new(runner, path, config.dependencies.clone()),
            state,
        )
    }
}

impl<S: SourceControl, D: DependencyManager> VersionControl<S, D> {
    /// Build a façade from its two helpers and the shared state.
    pub const fn new(source: S, deps: D, state: Arc<UpgradeState>) -> Self {
        Self {
            source,
            deps,
            state,
        }
    }

    /// Shared upgrade flags. The façade never reads or writes them itself.
    pub const fn state(&self) -> &Arc<UpgradeState> {
        &self.state
    }

    /// Check out tag `v<version>` and reinstall dependencies.
    pub async fn upgrade_subnet(&self, version: &str) -> UpgradeOutcome {
        self.switch_to(version, Direction::Upgrade).await
    }

    /// Same steps as [`upgrade_subnet`](Self::upgrade_subnet); only the log lines differ.
    pub async fn downgrade_subnet(&self, version: &str) -> UpgradeOutcome {
        self.switch_to(version, Direction::Downgrade).await
    }

    async fn switch_to(&self, version: &str, direction: Direction) -> UpgradeOutcome {
        if semver::Version::parse(version).is_err() {
            tracing::warn!("Version '{version}' is not in major.minor.patch form");
        }
        tracing::info!("Starting subnet {direction} to {version}");

        let tag = format!("{TAG_PREFIX}{version}");
        if let Err(e) = self.source.get_tag(&tag).await {
            return Self::failed(direction, version, FailureKind::SourceControl, &e);
        }
        if let Err(e) = self.deps.upgrade_dependencies().await {
            return Self::failed(direction, version, FailureKind::Dependencies, &e);
        }

        tracing::info!("Subnet {direction} to {version} successful");
        UpgradeOutcome::Completed {
            version: version.to_string(),
        }
    }

    fn failed(direction: Direction, version: &str, kind: FailureKind, error: &anyhow::Error) -> UpgradeOutcome {
        let message = format!("{error:#}");
        tracing::error!("Failed to {direction} the subnet to {version} ({kind}): {message}");
        UpgradeOutcome::Failed { kind, message }
    }
}
