//! Error handling.
//!
//! This module provides:
//! - Field-level validation errors raised by every model
//! - Executor errors (validation, transport, redirects, session setup)
//! - Transport error categorization
//! - Instruction errors carrying their source location

mod categorization;
mod types;

// Re-export public API
pub use categorization::categorize_reqwest_error;
pub use types::{
    HttpError, InitializationError, InstructionError, SourceLocation, TransportErrorKind,
    ValidationError,
};

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("port", "must be between 0 and 65535");
        assert_eq!(err.to_string(), "port: must be between 0 and 65535");
    }

    #[test]
    fn test_validation_error_nested() {
        let err = ValidationError::new("name", "does not match pattern").nested("files.0");
        assert_eq!(err.field, "files.0.name");
        assert_eq!(err.message, "does not match pattern");
    }

    #[test]
    fn test_transport_error_kinds_have_descriptions() {
        for kind in TransportErrorKind::iter() {
            assert!(!kind.as_str().is_empty());
            assert_eq!(kind.to_string(), kind.as_str());
        }
    }

    #[test]
    fn test_http_error_from_validation() {
        let err: HttpError = ValidationError::new("url", "invalid").into();
        assert!(matches!(err, HttpError::Validation(_)));
        assert!(err.to_string().contains("url: invalid"));
    }

    #[test]
    fn test_instruction_error_carries_location() {
        let location = SourceLocation::new(12, 7);
        let err = InstructionError::Runtime {
            location,
            message: "bad urljoin arguments".to_string(),
        };
        assert_eq!(err.location(), location);
        assert_eq!(err.to_string(), "line 12, column 7: bad urljoin arguments");
    }
}
