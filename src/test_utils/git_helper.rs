//! Git test helper utilities
//!
//! Drives real git in scratch directories so tests can build a remote with
//! release tags and a node checkout to upgrade.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Git command wrapper for tests
///
/// Use this instead of raw `std::process::Command` for git operations in tests.
pub struct TestGit {
    repo_path: PathBuf,
}

impl TestGit {
    fn run_git_command(&self, args: &[&str], action: &str) -> Result<std::process::Output> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_path)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .with_context(|| action.to_string())?;

        if !output.status.success() {
            bail!("{} failed: {}", action, String::from_utf8_lossy(&output.stderr));
        }

        Ok(output)
    }

    fn stdout(&self, args: &[&str], action: &str) -> Result<String> {
        let output = self.run_git_command(args, action)?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Create a new TestGit instance for the given repository path
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }

    /// Return the repository path
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// Initialize a repository whose first branch is `main`, with a test identity
    pub fn init(&self) -> Result<()> {
        std::fs::create_dir_all(&self.repo_path)?;
        self.run_git_command(&["init"], "Failed to initialize git repository")?;
        // Works on git versions that predate --initial-branch
        self.run_git_command(&["symbolic-ref", "HEAD", "refs/heads/main"], "Failed to set HEAD")?;
        self.config_user()
    }

    /// Initialize a bare git repository
    pub fn init_bare(&self) -> Result<()> {
        std::fs::create_dir_all(&self.repo_path)?;
        self.run_git_command(&["init", "--bare"], "Failed to initialize bare git repository")?;
        self.run_git_command(&["symbolic-ref", "HEAD", "refs/heads/main"], "Failed to set HEAD")?;
        Ok(())
    }

    /// Configure git user for tests
    pub fn config_user(&self) -> Result<()> {
        self.run_git_command(
            &["config", "user.email", "test@subnet-upgrade.example"],
            "Failed to configure git user email",
        )?;
        self.run_git_command(
            &["config", "user.name", "Test User"],
            "Failed to configure git user name",
        )?;
        self.run_git_command(&["config", "commit.gpgsign", "false"], "Failed to disable signing")?;
        self.run_git_command(&["config", "tag.gpgsign", "false"], "Failed to disable signing")?;
        Ok(())
    }

    /// Write `content` to `file` and commit it
    pub fn commit_file(&self, file: &str, content: &str, message: &str) -> Result<()> {
        std::fs::write(self.repo_path.join(file), content)
            .with_context(|| format!("Failed to write {file}"))?;
        self.run_git_command(&["add", "."], "Failed to add files to git")?;
        self.run_git_command(&["commit", "-m", message], "Failed to create git commit")?;
        Ok(())
    }

    /// Create a lightweight tag at HEAD
    pub fn tag(&self, tag_name: &str) -> Result<()> {
        self.run_git_command(&["tag", tag_name], &format!("Failed to create tag: {tag_name}"))?;
        Ok(())
    }

    /// Checkout a branch, tag or commit
    pub fn checkout(&self, ref_name: &str) -> Result<()> {
        self.run_git_command(&["checkout", ref_name], &format!("Failed to checkout: {ref_name}"))?;
        Ok(())
    }

    /// Add a remote repository
    pub fn remote_add(&self, name: &str, url: &str) -> Result<()> {
        self.run_git_command(&["remote", "add", name, url], &format!("Failed to add remote: {name}"))?;
        Ok(())
    }

    /// Push every branch and tag to `remote`
    pub fn push_all(&self, remote: &str) -> Result<()> {
        self.run_git_command(&["push", remote, "--all"], "Failed to push branches")?;
        self.run_git_command(&["push", remote, "--tags"], "Failed to push tags")?;
        Ok(())
    }

    /// Clone `url` into `target` and return a helper for the clone
    pub fn clone_from(url: &str, target: impl Into<PathBuf>) -> Result<Self> {
        let target = target.into();
        let output = Command::new("git")
            .args(["clone", url])
            .arg(&target)
            .output()
            .context("Failed to run git clone")?;
        if !output.status.success() {
            bail!("git clone failed: {}", String::from_utf8_lossy(&output.stderr));
        }
        let clone = Self::new(target);
        clone.config_user()?;
        Ok(clone)
    }

    /// Get current commit SHA
    pub fn head_sha(&self) -> Result<String> {
        self.stdout(&["rev-parse", "HEAD"], "Failed to get current commit SHA")
    }

    /// Commit SHA a tag points to
    pub fn tag_sha(&self, tag_name: &str) -> Result<String> {
        self.stdout(
            &["rev-parse", &format!("{tag_name}^{{commit}}")],
            &format!("Failed to resolve tag: {tag_name}"),
        )
    }

    /// Get the current branch name (empty when detached)
    pub fn current_branch(&self) -> Result<String> {
        self.stdout(&["branch", "--show-current"], "Failed to get current branch name")
    }

    /// Get porcelain status output
    pub fn status_porcelain(&self) -> Result<String> {
        self.stdout(&["status", "--porcelain"], "Failed to get git status")
    }

    /// Number of stash entries
    pub fn stash_count(&self) -> Result<usize> {
        Ok(self.stdout(&["stash", "list"], "Failed to list stashes")?.lines().count())
    }
}
