//! Dependency reinstallation after a checkout.
//!
//! Two steps, always in this order:
//!
//! 1. `pip install -r <requirements>` - third-party dependencies of the new version
//! 2. `pip install -e .` - the node package itself, in editable mode
//!
//! The package manager is configurable (`[dependencies]` in the config), so a
//! node running from a virtualenv can use `python3 -m pip` or a pinned path.

use anyhow::{Context, Result};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::DependencyConfig;
use crate::process::{CommandOutput, CommandRunner, Invocation, Tool};

/// Dependency helper the version-control façade depends on.
pub trait DependencyManager: Send + Sync {
    /// Reinstall the dependencies of whatever is checked out.
    fn upgrade_dependencies(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Builder for package-manager invocations.
#[derive(Debug, Clone)]
pub struct PipCommand {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl PipCommand {
    /// Start a command for `program` with `prefix_args` in front of everything else.
    pub fn new(program: impl Into<String>, prefix_args: &[String]) -> Self {
        Self {
            program: program.into(),
            args: prefix_args.to_vec(),
            current_dir: None,
            timeout: None,
        }
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

    /// Run in `dir`.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Set a timeout (None for no timeout)
    pub const fn with_timeout(mut self, duration: Option<Duration>) -> Self {
        self.timeout = duration;
        self
    }

    /// Finish building.
    pub fn into_invocation(self) -> Invocation {
        Invocation {
            tool: Tool::PackageManager,
            program: self.program,
            args: self.args,
            current_dir: self.current_dir,
            // Keep pip from asking questions or nagging about its own version
            env_vars: vec![
                ("PIP_NO_INPUT".to_string(), "1".to_string()),
                ("PIP_DISABLE_PIP_VERSION_CHECK".to_string(), "1".to_string()),
            ],
            timeout: self.timeout,
            context: Some("dependencies".to_string()),
        }
    }

    /// Execute the command and return the output
    pub async fn execute<R: CommandRunner>(self, runner: &R) -> Result<CommandOutput> {
        runner.run(self.into_invocation()).await
    }
}

/// Reinstalls a checkout's Python dependencies through a [`CommandRunner`].
#[derive(Debug)]
pub struct PipInstaller<R> {
    runner: Arc<R>,
    path: PathBuf,
    config: DependencyConfig,
}

impl<R> Clone for PipInstaller<R> {
    fn clone(&self) -> Self {
        Self {
            runner: Arc::clone(&self.runner),
            path: self.path.clone(),
            config: self.config.clone(),
        }
    }
}

impl<R: CommandRunner> PipInstaller<R> {
    /// Installer for the checkout at `path`.
    pub fn new(runner: Arc<R>, path: impl Into<PathBuf>, config: DependencyConfig) -> Self {
        Self {
            runner,
            path: path.into(),
            config,
        }
    }

    fn command(&self) -> PipCommand {
        PipCommand::new(&self.config.program, &self.config.prefix_args)
            .current_dir(&self.path)
            .with_timeout(self.config.timeout())
    }

    /// `pip install -r <requirements>`
    pub async fn install_requirements(&self) -> Result<()> {
        let requirements = &self.config.requirements;
        self.command()
            .args(["install", "-r", requirements.as_str()])
            .execute(self.runner.as_ref())
            .await
            .with_context(|| format!("Failed to install dependencies from {requirements}"))?;
        tracing::info!("Dependencies installed from {requirements}");
        Ok(())
    }

    /// `pip install -e .`
    pub async fn install_editable(&self) -> Result<()> {
        self.command()
            .args(["install", "-e", "."])
            .execute(self.runner.as_ref())
            .await
            .context("Failed to install the node package in editable mode")?;
        tracing::info!("Source installed in editable mode");
        Ok(())
    }
}

impl<R: CommandRunner> DependencyManager for PipInstaller<R> {
    async fn upgrade_dependencies(&self) -> Result<()> {
        self.install_requirements().await?;
        if self.config.editable {
            self.install_editable().await?;
        } else {
            tracing::debug!("Editable install disabled, skipping");
        }
        Ok(())
    }
}
