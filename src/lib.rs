//! subnet-upgrade - self-upgrade for subnet node checkouts
//!
//! A node runs from a git checkout of its own source. Upgrading means
//! fetching a release tag (or tracking a branch), checking it out and
//! reinstalling the node's Python dependencies. This crate does that from two
//! surfaces:
//!
//! - the `subnet-upgrade` binary ([`cli`]), which runs the full sequence in
//!   [`upgrade`] and does nothing when HEAD is already at the requested tag or
//!   branch
//! - the [`version`] façade, which a running node calls with a bare version
//!   (`upgrade_subnet("1.3.0")` checks out `v1.3.0`) and which reports
//!   failures as a value instead of an error
//!
//! # Modules
//!
//! - [`cli`] - command-line parsing, logging setup and the upgrade command
//! - [`config`] - optional TOML configuration (remote, package manager, timeouts)
//! - [`constants`] - shared defaults
//! - [`core`] - error types and user-facing error rendering
//! - [`deps`] - dependency reinstallation (`pip install -r`, `pip install -e .`)
//! - [`git`] - the git operations an upgrade needs
//! - [`process`] - the [`CommandRunner`](process::CommandRunner) seam every
//!   external command goes through
//! - [`upgrade`] - the CLI upgrade sequence
//! - [`utils`] - platform helpers
//! - [`version`] - the version-control façade and its shared state
//!
//! All network access is delegated to git and pip; no credentials are handled
//! here.

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod deps;
pub mod git;
pub mod process;
pub mod upgrade;
pub mod utils;
pub mod version;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
