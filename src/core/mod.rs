//! Core types shared by every module: the error enum and its user-facing
//! rendering.

pub mod error;

pub use error::{ErrorContext, UpgradeError, user_friendly_error};
