//! Integration test suite for subnet-upgrade
//!
//! Every test builds a scratch remote with release tags and a node checkout
//! using real git; pip is replaced by `true` or a recording runner.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! - **cli**: the binary end to end
//! - **facade**: `upgrade_subnet` / `downgrade_subnet` against real git
//! - **git_position**: tag and branch detection on real repositories
//! - **upgrade_e2e**: the exact command sequence of a real upgrade

#[path = "../common/mod.rs"]
mod common;

mod cli;
mod facade;
mod git_position;
mod upgrade_e2e;
