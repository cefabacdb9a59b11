//! Shared resource setup.
//!
//! This module provides:
//! - Logger initialization (plain or JSON output)
//! - Session HTTP clients with a per-client certificate policy

mod client;
mod logger;

// Re-export public API
pub use client::init_session_client;
pub use logger::{init_logger, init_logger_with};
