//! The upgrade sequence run by the `subnet-upgrade` command.
//!
//! # Process Flow
//!
//! ```text
//! 1. Position check
//!    ├── git tag --points-at HEAD                 (tags HEAD is exactly at)
//!    └── git rev-parse --abbrev-ref HEAD          (fallback: current branch)
//!
//! 2. Already there? → log and stop, nothing else runs
//!
//! 3. Switch source
//!    ├── git status / git stash push              (tracked changes only, best effort)
//!    ├── git fetch <remote> --tags --force
//!    └── tag:    git checkout tags/<tag>
//!        branch: git checkout -B <branch> --track <remote>/<branch> && git pull
//!
//! 4. Reinstall
//!    ├── pip install -r requirements.txt
//!    └── pip install -e .
//! ```
//!
//! Any failing command aborts the rest of the sequence with its error. Nothing
//! is rolled back: if step 4 fails the new source is already checked out, and
//! rerunning the upgrade for the same target will short-circuit at step 2. Run
//! the install step by hand in that case.


use anyhow::Result;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::UpgradeConfig;
use crate::core::UpgradeError;
use crate::deps::{DependencyManager, PipInstaller};
use crate::git::{GitRepository, Position};
use crate::process::CommandRunner;

/// What the upgrade should switch to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A release tag, checked out detached
    Tag(String),
    /// A branch, tracked from the remote and pulled
    Branch(String),
}

impl Target {
    /// Build a target from the command-line values.
    ///
    /// The tag wins when both are given. Empty strings count as absent; when
    /// neither is usable `None` is returned.
    #[must_use]
    pub fn from_args(tag: Option<&str>, branch: Option<&str>) -> Option<Self> {
        let present = |value: Option<&str>| value.filter(|v| !v.is_empty()).map(str::to_string);

        present(tag).map(Self::Tag).or_else(|| present(branch).map(Self::Branch))
    }

    /// The tag or branch name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Tag(name) | Self::Branch(name) => name,
        }
    }

    /// Reject names git would parse as options or that cannot be a ref.
    ///
    /// # Errors
    ///
    /// Returns [`UpgradeError::InvalidTarget`] for names that start with `-`
    /// or contain whitespace or control characters.
    pub fn validate(&self) -> Result<()> {
        let name = self.name();
        let reason = if name.starts_with('-') {
            Some("names may not start with '-'")
        } else if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
            Some("names may not contain whitespace or control characters")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(UpgradeError::InvalidTarget {
                target: name.to_string(),
                reason: reason.to_string(),
            }
            .into()),
            None => Ok(()),
        }
    }

    /// Whether HEAD is already where this target points.
    ///
    /// A tag matches when it is any of the tags on HEAD; a branch matches by name.
    #[must_use]
    pub fn is_current(&self, position: &Position) -> bool {
        match (self, position) {
            (Self::Tag(want), position) => position.has_tag(want),
            (Self::Branch(want), Position::Branch(have)) => want == have,
            (Self::Branch(_), Position::Tags(_)) => false,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(name) => write!(f, "tag {name}"),
            Self::Branch(name) => write!(f, "branch {name}"),
        }
    }
}

/// Result of a completed [`Upgrader::upgrade`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeReport {
    /// HEAD was already at the target; nothing ran
    AlreadyCurrent(Position),
    /// The source was switched and dependencies reinstalled
    Upgraded {
        /// Where HEAD was before
        from: Position,
        /// Where HEAD is now
        to: Target,
        /// Whether local changes were stashed on the way
        stashed: bool,
    },
}

/// Runs the upgrade sequence on one checkout.
#[derive(Debug)]
pub struct Upgrader<R> {
    repo: GitRepository<R>,
    deps: PipInstaller<R>,
    stash_local_changes: bool,
}

impl<R: CommandRunner> Upgrader<R> {
    /// Upgrader for the checkout at `path`.
    pub fn new(runner: Arc<R>, path: impl Into<PathBuf>, config: &UpgradeConfig) -> Self {
        let path = path.into();
        Self {
            repo: GitRepository::new(Arc::clone(&runner), path.clone(), &config.git),
            deps: PipInstaller::new(runner, path, config.dependencies.clone()),
            stash_local_changes: config.git.stash_local_changes,
        }
    }

    /// The repository being upgraded.
    pub fn repository(&self) -> &GitRepository<R> {
        &self.repo
    }

    /// Switch the checkout to `target` and reinstall dependencies.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error; later steps do not run.
    pub async fn upgrade(&self, target: &Target) -> Result<UpgradeReport> {
        target.validate()?;

        let position = self.repo.current_position().await?;
        tracing::debug!("Currently on {position}");

        if target.is_current(&position) {
            tracing::warn!("The {target} is already checked out, nothing to do");
            return Ok(UpgradeReport::AlreadyCurrent(position));
        }

        tracing::info!("Upgrading from {position} to {target}");

        let stashed = if self.stash_local_changes {
            // Best effort: a checkout blocked by local changes reports its own error
            match self.repo.stash_local_changes(&format!("subnet-upgrade: before {target}")).await {
                Ok(stashed) => stashed,
                Err(e) => {
                    tracing::warn!("Could not stash local changes, continuing: {e:#}");
                    false
                }
            }
        } else {
            false
        };

        self.repo.fetch_tags().await?;

        match target {
            Target::Tag(tag) => self.repo.checkout_tag(tag).await?,
            Target::Branch(branch) => self.repo.track_branch(branch).await?,
        }
        tracing::info!("Successfully pulled source code for {target}");

        self.deps.upgrade_dependencies().await?;
        tracing::info!("Upgrade to {target} complete");

        Ok(UpgradeReport::Upgraded {
            from: position,
            to: target.clone(),
            stashed,
        })
    }
}
