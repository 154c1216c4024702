//! Type-safe Git command builder
//!
//! A fluent API for building git invocations so every git call made during an
//! upgrade goes through the same timeout, logging and error handling.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::GIT_TIMEOUT;
use crate::process::{CommandOutput, CommandRunner, Invocation, Tool};
use crate::utils::platform::get_git_command;

/// Builder for git invocations.
///
/// # Examples
///
/// ```rust,no_run
/// use subnet_upgrade::git::command_builder::GitCommand;
/// use subnet_upgrade::process::SystemRunner;
///
/// # async fn example() -> anyhow::Result<()> {
/// let runner = SystemRunner::new();
/// let branch = GitCommand::current_branch()
///     .current_dir("/srv/node")
///     .execute_stdout(&runner)
///     .await?;
/// # Ok(())
/// # }
/// ```
///
/// # Default Configuration
///
/// - **Timeout**: 5 minutes
/// - **Prompts**: disabled (`GIT_TERMINAL_PROMPT=0`)
/// - **Working directory**: the process's current directory
#[derive(Debug, Clone)]
pub struct GitCommand {
    /// Command arguments to pass to git (e.g., ["fetch", "origin", "--tags"])
    args: Vec<String>,

    /// Working directory for command execution
    current_dir: Option<PathBuf>,

    /// Environment variables to set for the git process
    env_vars: Vec<(String, String)>,

    /// Maximum duration to wait for command completion (None = no timeout)
    timeout_duration: Option<Duration>,

    /// Optional context string for log lines
    context: Option<String>,
}

impl Default for GitCommand {
    fn default() -> Self {
        Self {
            args: Vec::new(),
            current_dir: None,
            // Never let git wait on a credential prompt in an unattended upgrade
            env_vars: vec![("GIT_TERMINAL_PROMPT".to_string(), "0".to_string())],
            timeout_duration: Some(GIT_TIMEOUT),
            context: None,
        }
    }
}

impl GitCommand {
    /// Creates a new git command builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the working directory (passed to git as `-C <dir>`).
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Adds a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Adds multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set a custom timeout for the command (None for no timeout)
    pub const fn with_timeout(mut self, duration: Option<Duration>) -> Self {
        self.timeout_duration = duration;
        self
    }

    /// Set a context label included in debug log lines.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Arguments as they will be passed to git (without `-C`).
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Finish building.
    pub fn into_invocation(self) -> Invocation {
        Invocation {
            tool: Tool::Git,
            program: get_git_command().to_string(),
            args: self.args,
            current_dir: self.current_dir,
            env_vars: self.env_vars,
            timeout: self.timeout_duration,
            context: self.context,
        }
    }

    /// Execute the command and return the output
    pub async fn execute<R: CommandRunner>(self, runner: &R) -> Result<CommandOutput> {
        runner.run(self.into_invocation()).await
    }

    /// Execute the command and return only stdout as a trimmed string
    pub async fn execute_stdout<R: CommandRunner>(self, runner: &R) -> Result<String> {
        let output = self.execute(runner).await?;
        Ok(output.stdout.trim().to_string())
    }

    /// Execute the command and check for success, discarding output
    pub async fn execute_success<R: CommandRunner>(self, runner: &R) -> Result<()> {
        self.execute(runner).await?;
        Ok(())
    }
}

// Convenience builders for the operations an upgrade performs

impl GitCommand {
    /// Every tag pointing at HEAD, one per line; empty when HEAD is untagged.
    ///
    /// Constrained to `HEAD` so tags elsewhere in history are never reported.
    pub fn tags_at_head() -> Self {
        Self::new().args(["tag", "--points-at", "HEAD"])
    }

    /// Short name of the current branch (`HEAD` when detached).
    pub fn current_branch() -> Self {
        Self::new().args(["rev-parse", "--abbrev-ref", "HEAD"])
    }

    /// Status of tracked files only; empty output means nothing to stash.
    ///
    /// Untracked files are left out because [`stash`](Self::stash) never
    /// touches them.
    pub fn status_porcelain() -> Self {
        Self::new().args(["status", "--porcelain", "--untracked-files=no"])
    }

    /// Stash changes to tracked files. Untracked files stay in the working tree.
    pub fn stash(message: &str) -> Self {
        Self::new().args(["stash", "push", "--message", message])
    }

    /// Fetch every tag from `remote`, moving tags that were re-pointed upstream.
    pub fn fetch_tags(remote: &str) -> Self {
        Self::new().args(["fetch", remote, "--tags", "--force"])
    }

    /// Check out a tag (detached HEAD).
    pub fn checkout_tag(tag: &str) -> Self {
        Self::new().args(["checkout".to_string(), format!("tags/{tag}")])
    }

    /// Create or reset a local branch so it tracks `remote/branch`.
    pub fn checkout_tracking_branch(branch: &str, remote: &str) -> Self {
        Self::new().args([
            "checkout".to_string(),
            "-B".to_string(),
            branch.to_string(),
            "--track".to_string(),
            format!("{remote}/{branch}"),
        ])
    }

    /// Pull the upstream of the current branch.
    pub fn pull() -> Self {
        Self::new().arg("pull")
    }
}
