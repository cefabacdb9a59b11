//! Plugin configuration and constants.
//!
//! This module provides:
//! - Configuration constants (session defaults, limits, parameter names)
//! - The `Config` struct and logging option types

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{Config, LogFormat, LogLevel};
