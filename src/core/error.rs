//! Error handling for subnet-upgrade
//!
//! The error system follows two rules:
//! 1. **Strongly-typed errors** ([`UpgradeError`]) for every failure the upgrade
//!    sequence can hit, so callers can match on the cause.
//! 2. **User-friendly messages** ([`ErrorContext`]) with details and an actionable
//!    suggestion when the error reaches the command line.
//!
//! Library code returns [`anyhow::Result`] and attaches context with
//! [`anyhow::Context`]; the typed error stays reachable through
//! [`anyhow::Error::downcast_ref`], which is how [`user_friendly_error`] picks the
//! right suggestion.
//!
//! # Examples
//!
//! ```rust,no_run
//! use subnet_upgrade::core::{UpgradeError, user_friendly_error};
//!
//! let error = anyhow::Error::from(UpgradeError::GitNotFound);
//! let context = user_friendly_error(error);
//! context.display(); // coloured output on stderr
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for upgrade operations.
///
/// # Error Categories
///
/// ## Source control
/// - [`GitNotFound`](Self::GitNotFound) - git executable not available
/// - [`GitCommandError`](Self::GitCommandError) - git exited with a non-zero status
/// - [`GitCheckoutFailed`](Self::GitCheckoutFailed) - checkout of a tag or branch failed
///
/// ## Dependencies
/// - [`PackageManagerNotFound`](Self::PackageManagerNotFound) - pip (or the configured tool) is missing
/// - [`PackageManagerError`](Self::PackageManagerError) - dependency installation failed
///
/// ## Input and configuration
/// - [`InvalidTarget`](Self::InvalidTarget) - the requested tag or branch is unusable
/// - [`ConfigError`](Self::ConfigError) - the configuration file is invalid
#[derive(Error, Debug)]
pub enum UpgradeError {
    /// Git operation failed during execution
    ///
    /// Returned when a git command exits with a non-zero status. Common causes
    /// are network problems, missing credentials for the remote, or a working
    /// tree in an unexpected state.
    #[error("Git operation failed: {operation}")]
    GitCommandError {
        /// The git operation that failed (e.g., "fetch", "stash", "pull")
        operation: String,
        /// The error output from the git command
        stderr: String,
    },

    /// Git executable not found in PATH
    #[error("Git is not installed or not found in PATH")]
    GitNotFound,

    /// Git checkout failed
    #[error("Failed to checkout reference '{reference}'")]
    GitCheckoutFailed {
        /// The git reference (tag or branch) that failed to checkout
        reference: String,
        /// The reason for the checkout failure
        reason: String,
    },

    /// The package manager could not be started
    #[error("Package manager '{program}' is not installed or not found in PATH")]
    PackageManagerNotFound {
        /// The program that was looked up
        program: String,
    },

    /// Dependency installation failed
    ///
    /// Returned when the package manager exits with a non-zero status. The
    /// working tree has usually already been switched when this happens.
    #[error("Dependency installation failed: {operation}")]
    PackageManagerError {
        /// The install step that failed (e.g., "install -r requirements.txt")
        operation: String,
        /// The error output from the package manager
        stderr: String,
    },

    /// An external command did not finish in time
    #[error("{program} {operation} timed out after {seconds} seconds")]
    CommandTimedOut {
        /// Program that was running (git, pip)
        program: String,
        /// Operation being performed
        operation: String,
        /// Timeout that elapsed
        seconds: u64,
    },

    /// The requested tag or branch cannot be used
    #[error("Invalid upgrade target '{target}': {reason}")]
    InvalidTarget {
        /// The tag or branch as given
        target: String,
        /// Why it was rejected
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Anything else
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

impl Clone for UpgradeError {
    fn clone(&self) -> Self {
        match self {
            Self::GitCommandError {
                operation,
                stderr,
            } => Self::GitCommandError {
                operation: operation.clone(),
                stderr: stderr.clone(),
            },
            Self::GitNotFound => Self::GitNotFound,
            Self::GitCheckoutFailed {
                reference,
                reason,
            } => Self::GitCheckoutFailed {
                reference: reference.clone(),
                reason: reason.clone(),
            },
            Self::PackageManagerNotFound {
                program,
            } => Self::PackageManagerNotFound {
                program: program.clone(),
            },
            Self::PackageManagerError {
                operation,
                stderr,
            } => Self::PackageManagerError {
                operation: operation.clone(),
                stderr: stderr.clone(),
            },
            Self::CommandTimedOut {
                program,
                operation,
                seconds,
            } => Self::CommandTimedOut {
                program: program.clone(),
                operation: operation.clone(),
                seconds: *seconds,
            },
            Self::InvalidTarget {
                target,
                reason,
            } => Self::InvalidTarget {
                target: target.clone(),
                reason: reason.clone(),
            },
            Self::ConfigError {
                message,
            } => Self::ConfigError {
                message: message.clone(),
            },
            // io::Error and toml::de::Error are not Clone; keep their text.
            Self::IoError(e) => Self::IoError(std::io::Error::new(e.kind(), e.to_string())),
            Self::TomlError(e) => Self::Other {
                message: format!("TOML parsing error: {e}"),
            },
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// Error wrapper carrying user-facing details and a suggestion.
///
/// ```rust,no_run
/// use subnet_upgrade::core::{ErrorContext, UpgradeError};
///
/// let context = ErrorContext::new(UpgradeError::GitNotFound)
///     .with_suggestion("Install git from https://git-scm.com/")
///     .with_details("Upgrades are performed by running git in the node's checkout");
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: UpgradeError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: UpgradeError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr: error in red, details in yellow, suggestion in green.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with an actionable suggestion.
///
/// Recognises [`UpgradeError`] anywhere in the chain, [`std::io::Error`] and
/// [`toml::de::Error`]; anything else is reported with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(upgrade_error) = error
        .downcast_ref::<UpgradeError>()
        .or_else(|| error.chain().find_map(|e| e.downcast_ref::<UpgradeError>()))
    {
        return create_error_context(upgrade_error.clone());
    }

    if let Some(toml_error) = error.chain().find_map(|e| e.downcast_ref::<toml::de::Error>()) {
        return ErrorContext::new(UpgradeError::ConfigError {
            message: format!("{error}: {toml_error}"),
        })
        .with_suggestion("Check the TOML syntax of the configuration file");
    }

    ErrorContext::new(UpgradeError::Other {
        message: format_chain(&error),
    })
}

/// Render an error with its cause chain, one cause per line.
pub(crate) fn format_chain(error: &anyhow::Error) -> String {
    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }
    message
}

fn create_error_context(error: UpgradeError) -> ErrorContext {
    match &error {
        UpgradeError::GitNotFound => ErrorContext::new(error)
            .with_suggestion("Install git (e.g. 'apt install git') and make sure it is on PATH")
            .with_details("Upgrades check out the requested version with the git CLI"),
        UpgradeError::GitCommandError {
            operation,
            stderr,
        } => {
            let suggestion = if operation == "fetch" || operation == "pull" {
                "Check network access and credentials for the remote, then retry"
            } else if operation == "stash" {
                "Commit or discard local changes in the node's checkout, then retry"
            } else {
                "Run the git command manually in the node's checkout to see the full error"
            };
            let details = stderr.trim().to_string();
            let ctx = ErrorContext::new(error.clone()).with_suggestion(suggestion);
            if details.is_empty() {
                ctx
            } else {
                ctx.with_details(details)
            }
        }
        UpgradeError::GitCheckoutFailed {
            reference,
            reason,
        } => ErrorContext::new(error.clone())
            .with_details(reason.trim().to_string())
            .with_suggestion(format!(
                "Verify that '{reference}' exists on the remote ('git ls-remote --tags --heads')"
            )),
        UpgradeError::PackageManagerNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Activate the node's Python environment or set [dependencies].program in the config"),
        UpgradeError::PackageManagerError {
            stderr,
            ..
        } => ErrorContext::new(error.clone())
            .with_details(stderr.trim().to_string())
            .with_suggestion(
                "The source was already switched; fix the environment and rerun the upgrade to reinstall dependencies",
            ),
        UpgradeError::CommandTimedOut {
            ..
        } => ErrorContext::new(error).with_suggestion(
            "Check network connectivity or raise timeout_secs in the configuration",
        ),
        UpgradeError::InvalidTarget {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Pass a tag such as '--tag v1.2.3' or a branch such as '--branch main'"),
        UpgradeError::ConfigError {
            ..
        }
        | UpgradeError::TomlError(_) => ErrorContext::new(error)
            .with_suggestion("Check the configuration file against the documented [git] and [dependencies] keys"),
        UpgradeError::IoError(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            ErrorContext::new(error.clone()).with_suggestion(
                "Run the upgrade as the user that owns the node's checkout and Python environment",
            )
        }
        _ => ErrorContext::new(error),
    }
}
