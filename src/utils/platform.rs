//! Platform helpers: tool names, tool discovery and path expansion.

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Returns whether the current platform is Windows.
#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

/// Returns the platform-appropriate Git command name.
///
/// This is the command name, not a resolved path; git must still be on `PATH`.
/// Use [`command_exists`] to check availability up front.
#[must_use]
pub const fn get_git_command() -> &'static str {
    if is_windows() {
        "git.exe"
    } else {
        "git"
    }
}

/// Checks whether a command can be found on `PATH`.
#[must_use]
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Resolves a user-supplied path, expanding `~` and `$VAR` references.
///
/// # Examples
///
/// ```rust,no_run
/// use subnet_upgrade::utils::platform::resolve_path;
///
/// let path = resolve_path("~/node/subnet-upgrade.toml")?;
/// # Ok::<(), anyhow::Error>(())
/// ```
///
/// # Errors
///
/// Returns an error when a referenced environment variable is not set or the
/// home directory cannot be determined.
pub fn resolve_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path).with_context(|| format!("Invalid path: {path}"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}
