//! Error type definitions.
//!
//! This module defines all error types used throughout the crate.

use std::fmt;
use std::path::PathBuf;

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// A model or parameter failed one of its field constraints.
///
/// `field` names the offending field (dotted for nested values, e.g.
/// `files.0.name`), `message` states the violated constraint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Offending field
    pub field: String,
    /// Violated constraint
    pub message: String,
}

impl ValidationError {
    /// Creates a validation error for `field`.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Prefixes the field path with the enclosing field name.
    ///
    /// Used when a nested model fails so the caller sees the full path.
    pub fn nested(self, parent: impl fmt::Display) -> Self {
        Self {
            field: format!("{}.{}", parent, self.field),
            message: self.message,
        }
    }
}

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// The CA bundle could not be read.
    #[error("CA bundle read error for {path}: {source}")]
    CaBundleReadError {
        /// Bundle location
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The CA bundle could not be parsed as PEM certificates.
    #[error("CA bundle parse error for {path}: {source}")]
    CaBundleParseError {
        /// Bundle location
        path: PathBuf,
        /// Underlying parse failure
        #[source]
        source: ReqwestError,
    },
}

/// Categories of transport failures.
///
/// Mirrors the `reqwest::Error` predicates so failures can be logged and
/// matched on without inspecting the error chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum TransportErrorKind {
    Builder,
    Redirect,
    Timeout,
    Connect,
    Request,
    Body,
    Decode,
    Other,
}

impl TransportErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportErrorKind::Builder => "request builder error",
            TransportErrorKind::Redirect => "redirect error",
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Connect => "connect error",
            TransportErrorKind::Request => "request error",
            TransportErrorKind::Body => "body error",
            TransportErrorKind::Decode => "decode error",
            TransportErrorKind::Other => "other error",
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by the request executor.
#[derive(Error, Debug)]
pub enum HttpError {
    /// A parameter or a normalized model failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The transport call failed.
    #[error("HTTP transport error ({kind}): {source}")]
    Transport {
        /// Failure category
        kind: TransportErrorKind,
        /// Underlying transport error
        #[source]
        source: ReqwestError,
    },

    /// The redirect chain exceeded the configured number of hops.
    #[error("Exceeded {0} redirects")]
    TooManyRedirects(usize),

    /// A session could not be created.
    #[error("Session initialization error: {0}")]
    Initialization(#[from] InitializationError),

    /// The response model could not be rendered as a mapping.
    #[error("Response serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ReqwestError> for HttpError {
    fn from(source: ReqwestError) -> Self {
        HttpError::Transport {
            kind: super::categorize_reqwest_error(&source),
            source,
        }
    }
}

/// Position of an instruction in the scenario source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// 1-based line
    pub line: usize,
    /// 1-based column
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Errors raised by DSL instructions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstructionError {
    /// The instruction text could not be parsed.
    #[error("{location}: {message}")]
    Schema {
        location: SourceLocation,
        message: String,
    },

    /// The instruction failed while being evaluated.
    #[error("{location}: {message}")]
    Runtime {
        location: SourceLocation,
        message: String,
    },
}

impl InstructionError {
    /// Location of the instruction that failed.
    pub fn location(&self) -> SourceLocation {
        match self {
            InstructionError::Schema { location, .. } | InstructionError::Runtime { location, .. } => {
                *location
            }
        }
    }
}
