use anyhow::{Context, Result};
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tokio::time::timeout;

use super::{CommandOutput, CommandRunner, Invocation, Tool};
use crate::constants::SLOW_COMMAND_THRESHOLD;
use crate::core::UpgradeError;

/// Runs invocations as real child processes via `tokio::process`.
///
/// - git receives the working directory through `-C`, which keeps it
///   independent of the process's own current directory; other tools get it
///   as the child's working directory
/// - stdout and stderr are captured, stdin is closed
/// - the invocation's timeout is enforced; the child is killed when it elapses
/// - stdout/stderr are logged at debug level under `process`, tagged with the tool
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    /// Create a runner that spawns real processes.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    async fn run(&self, invocation: Invocation) -> Result<CommandOutput> {
        let start = Instant::now();
        let target = invocation.tool.log_target();
        let mut cmd = Command::new(&invocation.program);

        let mut full_args = Vec::new();
        if let Some(ref dir) = invocation.current_dir {
            if invocation.tool == Tool::Git {
                // Use the path as-is to avoid symlink resolution issues on macOS
                full_args.push("-C".to_string());
                full_args.push(dir.display().to_string());
            } else {
                cmd.current_dir(dir);
            }
        }
        full_args.extend(invocation.args.iter().cloned());
        cmd.args(&full_args);

        match invocation.context {
            Some(ref ctx) => tracing::debug!(
                target: "process",
                "({}) Executing command: {} {}",
                ctx,
                invocation.program,
                full_args.join(" ")
            ),
            None => tracing::debug!(
                target: "process",
                "Executing command: {} {}",
                invocation.program,
                full_args.join(" ")
            ),
        }

        for (key, value) in &invocation.env_vars {
            tracing::trace!(target: "process", "Setting env var: {}={}", key, value);
            cmd.env(key, value);
        }

        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.stdin(Stdio::null());
        cmd.kill_on_drop(true);

        let output_future = cmd.output();

        let spawned = if let Some(duration) = invocation.timeout {
            match timeout(duration, output_future).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(
                        target: "process",
                        "Command timed out after {} seconds: {}",
                        duration.as_secs(),
                        invocation
                    );
                    return Err(UpgradeError::CommandTimedOut {
                        program: invocation.program.clone(),
                        operation: invocation.operation(),
                        seconds: duration.as_secs(),
                    }
                    .into());
                }
            }
        } else {
            output_future.await
        };

        let output = match spawned {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(target: "process", "Failed to spawn {}: {}", invocation.program, e);
                return Err(anyhow::Error::from(invocation.not_found())
                    .context(format!("Failed to execute {invocation}")));
            }
            Err(e) => {
                return Err(anyhow::Error::from(UpgradeError::IoError(e)))
                    .with_context(|| format!("Failed to execute {invocation}"));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            tracing::debug!(
                target: "process",
                "Command failed with exit code: {:?}",
                output.status.code()
            );
            if !stderr.is_empty() {
                tracing::debug!(target: "process", "Error: {}", stderr.trim());
            }
            return Err(invocation.failure(&stderr, &stdout).into());
        }

        if !stdout.is_empty() {
            tracing::debug!(target: "process", "[{}] {}", target, stdout.trim());
        }
        if !stderr.is_empty() {
            tracing::debug!(target: "process", "[{}] {}", target, stderr.trim());
        }

        let elapsed = start.elapsed();
        if elapsed > SLOW_COMMAND_THRESHOLD {
            tracing::info!(
                target: "process::perf",
                "{} {} took {:.2}s",
                invocation.program,
                invocation.operation(),
                elapsed.as_secs_f64()
            );
        } else if elapsed.as_millis() > 100 {
            tracing::debug!(
                target: "process::perf",
                "{} {} took {}ms",
                invocation.program,
                invocation.operation(),
                elapsed.as_millis()
            );
        }

        Ok(CommandOutput {
            stdout,
            stderr,
        })
    }
}
