//! Utility modules.

pub mod platform;

pub use platform::{command_exists, get_git_command, is_windows, resolve_path};
