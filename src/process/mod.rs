//! External command execution.
//!
//! Every step of an upgrade is an invocation of an external tool: git for the
//! source tree and the package manager for dependencies. Command builders
//! ([`GitCommand`](crate::git::command_builder::GitCommand),
//! [`PipCommand`](crate::deps::PipCommand)) produce an [`Invocation`]; a
//! [`CommandRunner`] executes it.
//!
//! [`SystemRunner`] spawns real processes. Tests swap in a runner that records
//! invocations and replays scripted results, which is how the exact command
//! sequence of an upgrade is checked without touching a real checkout.

mod system;

pub use system::SystemRunner;

use anyhow::Result;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::UpgradeError;

/// The external tool an [`Invocation`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// The git CLI
    Git,
    /// The Python package manager (pip or a configured replacement)
    PackageManager,
}

impl Tool {
    /// Label prefixed to this tool's log lines.
    #[must_use]
    pub const fn log_target(self) -> &'static str {
        match self {
            Self::Git => "git",
            Self::PackageManager => "pip",
        }
    }
}

/// A fully-specified external command, ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Which tool this runs; drives error mapping
    pub tool: Tool,
    /// Executable name or path
    pub program: String,
    /// Arguments, in order, excluding the program
    pub args: Vec<String>,
    /// Working directory (git receives it via `-C`)
    pub current_dir: Option<PathBuf>,
    /// Extra environment variables
    pub env_vars: Vec<(String, String)>,
    /// Maximum duration to wait (None = wait forever)
    pub timeout: Option<Duration>,
    /// Label included in log lines
    pub context: Option<String>,
}

impl Invocation {
    /// The leading subcommand (`fetch`, `checkout`, `install`, ...).
    #[must_use]
    pub fn operation(&self) -> String {
        self.args.first().cloned().unwrap_or_else(|| "unknown".to_string())
    }

    /// Command line as a single string, for logs and test assertions.
    #[must_use]
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }

    /// Map a non-zero exit into the typed error for this tool.
    ///
    /// Shared by every [`CommandRunner`] so a scripted failure in tests looks
    /// exactly like a real one.
    #[must_use]
    pub fn failure(&self, stderr: &str, stdout: &str) -> UpgradeError {
        let output = if stderr.trim().is_empty() {
            stdout.to_string()
        } else {
            stderr.to_string()
        };

        match self.tool {
            Tool::Git if self.args.first().is_some_and(|arg| arg == "checkout") => {
                // `checkout -B <branch> ...` names the branch, plain checkout the ref
                let reference = if self.args.get(1).is_some_and(|arg| arg == "-B") {
                    self.args.get(2).cloned().unwrap_or_default()
                } else {
                    self.args.get(1).cloned().unwrap_or_default()
                };
                UpgradeError::GitCheckoutFailed {
                    reference,
                    reason: output,
                }
            }
            Tool::Git => UpgradeError::GitCommandError {
                operation: self.operation(),
                stderr: output,
            },
            Tool::PackageManager => UpgradeError::PackageManagerError {
                operation: self.args.join(" "),
                stderr: output,
            },
        }
    }

    /// The error reported when the program cannot be started at all.
    #[must_use]
    pub fn not_found(&self) -> UpgradeError {
        match self.tool {
            Tool::Git => UpgradeError::GitNotFound,
            Tool::PackageManager => UpgradeError::PackageManagerNotFound {
                program: self.program.clone(),
            },
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Output from a successful command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output
    pub stdout: String,
    /// Standard error output
    pub stderr: String,
}

/// Executes [`Invocation`]s.
///
/// Implementations return `Ok` only when the command exited successfully; a
/// non-zero exit must surface as the error produced by
/// [`Invocation::failure`].
pub trait CommandRunner: Send + Sync {
    /// Run the invocation to completion.
    fn run(&self, invocation: Invocation) -> impl Future<Output = Result<CommandOutput>> + Send;
}
