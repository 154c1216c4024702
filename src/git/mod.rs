//! Source-control operations on the node's own checkout.
//!
//! [`GitRepository`] wraps the working tree the node runs from and exposes the
//! handful of git operations an upgrade needs. Every call goes through a
//! [`CommandRunner`], so the production code shells out to git while tests
//! record the exact command sequence.
//!
//! # Position detection
//!
//! [`GitRepository::current_position`] reports every tag HEAD sits on, if any,
//! and otherwise the current branch. The tag lookup is `git tag --points-at
//! HEAD`: it lists only tags on HEAD itself, so a tag somewhere else in history
//! never makes an upgrade look already applied. A commit can carry several
//! tags (`v1.2.0` and `release-1.2.0`), and all of them are kept.

pub mod command_builder;


use anyhow::{Context, Result};
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::GitConfig;
use crate::process::CommandRunner;
use command_builder::GitCommand;

/// Where HEAD currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    /// HEAD is exactly at these tags (never empty, in git's listing order)
    Tags(Vec<String>),
    /// HEAD is on this branch (`HEAD` when detached and untagged)
    Branch(String),
}

impl Position {
    /// HEAD at a single tag.
    #[must_use]
    pub fn tag(name: impl Into<String>) -> Self {
        Self::Tags(vec![name.into()])
    }

    /// Whether HEAD carries `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        match self {
            Self::Tags(tags) => tags.iter().any(|t| t == tag),
            Self::Branch(_) => false,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tags(tags) if tags.len() == 1 => write!(f, "tag {}", tags[0]),
            Self::Tags(tags) => write!(f, "tags {}", tags.join(", ")),
            Self::Branch(name) => write!(f, "branch {name}"),
        }
    }
}

/// Source-control helper the version-control façade depends on.
pub trait SourceControl: Send + Sync {
    /// Fetch remote tags and check out `tag`.
    fn get_tag(&self, tag: &str) -> impl Future<Output = Result<()>> + Send;
}

/// A git working tree driven through a [`CommandRunner`].
#[derive(Debug)]
pub struct GitRepository<R> {
    runner: Arc<R>,
    path: PathBuf,
    remote: String,
    timeout: Option<Duration>,
}

impl<R> Clone for GitRepository<R> {
    fn clone(&self) -> Self {
        Self {
            runner: Arc::clone(&self.runner),
            path: self.path.clone(),
            remote: self.remote.clone(),
            timeout: self.timeout,
        }
    }
}

impl<R: CommandRunner> GitRepository<R> {
    /// Open the working tree at `path` with the given git settings.
    pub fn new(runner: Arc<R>, path: impl Into<PathBuf>, config: &GitConfig) -> Self {
        Self {
            runner,
            path: path.into(),
            remote: config.remote.clone(),
            timeout: config.timeout(),
        }
    }

    /// Path of the working tree.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remote fetched from and tracked.
    pub fn remote(&self) -> &str {
        &self.remote
    }

    fn git(&self, command: GitCommand) -> GitCommand {
        command.current_dir(&self.path).with_timeout(self.timeout).with_context("source control")
    }

    /// The tags HEAD is exactly at, or the current branch.
    pub async fn current_position(&self) -> Result<Position> {
        let listing = self
            .git(GitCommand::tags_at_head())
            .execute_stdout(self.runner.as_ref())
            .await
            .context("Failed to list tags at HEAD")?;
        let tags: Vec<String> =
            listing.lines().map(str::trim).filter(|t| !t.is_empty()).map(str::to_string).collect();
        if !tags.is_empty() {
            return Ok(Position::Tags(tags));
        }
        tracing::debug!("HEAD is not at a tag");

        let branch = self
            .git(GitCommand::current_branch())
            .execute_stdout(self.runner.as_ref())
            .await
            .context("Failed to determine the current branch")?;
        Ok(Position::Branch(branch))
    }

    /// Whether tracked files have uncommitted changes. Untracked files do not count.
    pub async fn is_dirty(&self) -> Result<bool> {
        let status = self
            .git(GitCommand::status_porcelain())
            .execute_stdout(self.runner.as_ref())
            .await
            .context("Failed to read working tree status")?;
        Ok(!status.is_empty())
    }

    /// Stash local changes if there are any. Returns whether a stash was pushed.
    pub async fn stash_local_changes(&self, reason: &str) -> Result<bool> {
        if !self.is_dirty().await? {
            tracing::debug!("Working tree is clean, nothing to stash");
            return Ok(false);
        }

        self.git(GitCommand::stash(reason))
            .execute_success(self.runner.as_ref())
            .await
            .context("Failed to stash local changes")?;
        tracing::warn!("Local changes were stashed ({reason}); restore them with 'git stash pop'");
        Ok(true)
    }

    /// Fetch every tag from the remote, forcibly.
    pub async fn fetch_tags(&self) -> Result<()> {
        self.git(GitCommand::fetch_tags(&self.remote))
            .execute_success(self.runner.as_ref())
            .await
            .with_context(|| format!("Failed to fetch tags from '{}'", self.remote))?;
        tracing::debug!("Fetched tags from {}", self.remote);
        Ok(())
    }

    /// Check out `tag` (detached HEAD).
    pub async fn checkout_tag(&self, tag: &str) -> Result<()> {
        self.git(GitCommand::checkout_tag(tag))
            .execute_success(self.runner.as_ref())
            .await
            .with_context(|| format!("Failed to check out tag '{tag}'"))?;
        tracing::info!("Checked out tag {tag}");
        Ok(())
    }

    /// Create or reset `branch` to track `<remote>/<branch>`, then pull it.
    pub async fn track_branch(&self, branch: &str) -> Result<()> {
        self.git(GitCommand::checkout_tracking_branch(branch, &self.remote))
            .execute_success(self.runner.as_ref())
            .await
            .with_context(|| format!("Failed to check out branch '{branch}'"))?;
        tracing::debug!("Checked out branch {branch}");

        self.git(GitCommand::pull())
            .execute_success(self.runner.as_ref())
            .await
            .with_context(|| format!("Failed to pull branch '{branch}'"))?;
        tracing::info!("Pulled branch {branch}");
        Ok(())
    }
}

impl<R: CommandRunner> SourceControl for GitRepository<R> {
    async fn get_tag(&self, tag: &str) -> Result<()> {
        self.fetch_tags().await?;
        self.checkout_tag(tag).await
    }
}
