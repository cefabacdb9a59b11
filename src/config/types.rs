//! Configuration types.
//!
//! This module defines the enums and structs used to configure sessions,
//! transport limits and logging.

use std::time::Duration;

use crate::config::constants::{
    DEFAULT_FRAMEWORK_NAME, DEFAULT_FRAMEWORK_VERSION, DEFAULT_SESSION_NAME, MAX_REDIRECT_HOPS,
};
use crate::error_handling::ValidationError;

/// Logging level for the plugin.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Plugin configuration.
///
/// Built programmatically by the host runtime. Every field has a default, so
/// the usual pattern is struct update syntax:
///
/// ```
/// use loco_http::Config;
///
/// let config = Config {
///     framework_version: "2.1.0".to_string(),
///     max_redirects: 5,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Session used when a call does not name one
    pub default_session: String,

    /// Host framework name reported in the identification header
    pub framework_name: String,

    /// Host framework version reported in the identification header
    pub framework_version: String,

    /// Maximum redirect hops followed per call
    pub max_redirects: usize,

    /// Timeout applied when a call does not pass its own
    pub timeout: Option<Duration>,

    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_session: DEFAULT_SESSION_NAME.to_string(),
            framework_name: DEFAULT_FRAMEWORK_NAME.to_string(),
            framework_version: DEFAULT_FRAMEWORK_VERSION.to_string(),
            max_redirects: MAX_REDIRECT_HOPS,
            timeout: None,
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
        }
    }
}

impl Config {
    /// Checks the configuration for values the plugin cannot work with.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` naming the first offending field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.default_session.trim().is_empty() {
            return Err(ValidationError::new(
                "default_session",
                "must not be empty",
            ));
        }
        if self.framework_name.trim().is_empty() {
            return Err(ValidationError::new("framework_name", "must not be empty"));
        }
        if self.framework_version.trim().is_empty() {
            return Err(ValidationError::new(
                "framework_version",
                "must not be empty",
            ));
        }
        if self.max_redirects == 0 {
            return Err(ValidationError::new(
                "max_redirects",
                "must be greater than 0",
            ));
        }
        if let Some(timeout) = self.timeout {
            if timeout.is_zero() {
                return Err(ValidationError::new("timeout", "must be greater than 0"));
            }
        }
        Ok(())
    }
}
