//! Constants used throughout subnet-upgrade.
//!
//! Timeouts and defaults live here so the config layer and the command
//! builders agree on them.

use std::time::Duration;

/// Branch tracked when the CLI is invoked without `--tag` or `--branch`.
pub const DEFAULT_BRANCH: &str = "main";

/// Remote fetched from and tracked by branch upgrades.
pub const DEFAULT_REMOTE: &str = "origin";

/// Prefix put in front of a bare version to form its release tag.
pub const TAG_PREFIX: &str = "v";

/// Dependency manifest installed after every checkout.
pub const DEFAULT_REQUIREMENTS_FILE: &str = "requirements.txt";

/// Package manager used to reinstall dependencies.
pub const DEFAULT_PACKAGE_MANAGER: &str = "pip";

/// Name of the repository-local configuration file.
pub const CONFIG_FILE_NAME: &str = "subnet-upgrade.toml";

/// Default timeout for git operations (fetch over a slow link included).
pub const GIT_TIMEOUT_SECS: u64 = 300;

/// Default timeout for dependency installation; wheels can take a while to build.
pub const PACKAGE_MANAGER_TIMEOUT_SECS: u64 = 900;

/// Default timeout for git operations as a [`Duration`].
pub const GIT_TIMEOUT: Duration = Duration::from_secs(GIT_TIMEOUT_SECS);

/// Commands slower than this are logged at info level under the `process::perf` target.
pub const SLOW_COMMAND_THRESHOLD: Duration = Duration::from_secs(1);
