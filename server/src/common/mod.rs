//! Common Utilities
//!
//! Shared types, error handling, and path helpers used across the daemon.

pub mod error;
pub mod paths;

pub use error::{AppError, AppResult, ErrorCode};
pub use paths::{briefing_dir, config_path, models_dir, socket_path};
