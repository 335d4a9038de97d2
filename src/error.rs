//! Unified error handling for rocmlens
//!
//! This module provides a centralized error type for the analysis engine.
//! Errors are categorized for:
//! - Configuration errors (unknown architecture, incomplete metadata)
//! - Data errors (required input absent)
//! - Input errors (malformed trace rows)
//! - I/O and serialization errors (bundle loading, report export)
//!
//! Optional analysis stages never produce errors for absent input; the
//! corresponding report section is omitted instead.

use std::fmt;

/// Unified error type for rocmlens
#[derive(Debug, thiserror::Error)]
pub enum LensError {
    // ========== Configuration Errors ==========
    /// Architecture identifier not present in the registry
    #[error("Unsupported architecture '{0}'")]
    UnknownArchitecture(String),

    /// Dynamic architecture metadata lacks a required field
    #[error("Architecture metadata is missing required field '{0}'")]
    MissingMetadataField(&'static str),

    /// Invalid analysis configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    // ========== Data Errors ==========
    /// A required input is absent
    #[error("Required data not found: {0}")]
    DataNotFound(String),

    /// Trace rows violate a structural invariant
    #[error("Invalid trace: {0}")]
    InvalidTrace(String),

    // ========== I/O Errors ==========
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // ========== Internal Errors ==========
    /// Internal error (indicates a bug)
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl LensError {
    /// Categorize the error for handling decisions
    pub fn category(&self) -> ErrorCategory {
        match self {
            LensError::UnknownArchitecture(_)
            | LensError::MissingMetadataField(_)
            | LensError::InvalidConfiguration(_) => ErrorCategory::Configuration,

            LensError::DataNotFound(_) => ErrorCategory::DataNotFound,

            LensError::InvalidTrace(_) => ErrorCategory::Input,

            LensError::IoError(_) | LensError::SerializationError(_) => ErrorCategory::Io,

            LensError::InternalError(_) => ErrorCategory::Internal,
        }
    }

    /// Check if this is a configuration error (fatal, surfaced verbatim)
    pub fn is_configuration_error(&self) -> bool {
        matches!(self.category(), ErrorCategory::Configuration)
    }

    /// Check if a required input was absent
    pub fn is_data_not_found(&self) -> bool {
        matches!(self.category(), ErrorCategory::DataNotFound)
    }

    /// Check if this is an internal error (indicates a bug)
    pub fn is_internal_error(&self) -> bool {
        matches!(self.category(), ErrorCategory::Internal)
    }
}

/// Error category for handling decisions
///
/// - Configuration: fix the architecture selection or metadata
/// - DataNotFound: a required input table was not supplied
/// - Input: trace rows are malformed
/// - Io: file or JSON problems
/// - Internal: report as bug
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Configuration error - unknown architecture or incomplete metadata
    Configuration,
    /// Required data absent
    DataNotFound,
    /// Malformed input rows
    Input,
    /// File or serialization failure
    Io,
    /// Internal error - indicates a bug
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Configuration => write!(f, "Configuration"),
            ErrorCategory::DataNotFound => write!(f, "DataNotFound"),
            ErrorCategory::Input => write!(f, "Input"),
            ErrorCategory::Io => write!(f, "Io"),
            ErrorCategory::Internal => write!(f, "Internal"),
        }
    }
}

impl From<serde_json::Error> for LensError {
    fn from(err: serde_json::Error) -> Self {
        LensError::SerializationError(err.to_string())
    }
}

/// Helper type alias for Results using LensError
pub type LensResult<T> = std::result::Result<T, LensError>;

// ========== Helper Macros ==========

/// Create a configuration error with context
///
/// # Examples
/// ```ignore
/// return Err(config_error!("simd_per_cu must be non-zero"));
/// ```
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::error::LensError::InvalidConfiguration($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::LensError::InvalidConfiguration(format!($fmt, $($arg)*))
    };
}

/// Create a data-not-found error with context
#[macro_export]
macro_rules! data_not_found {
    ($msg:expr) => {
        $crate::error::LensError::DataNotFound($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::LensError::DataNotFound(format!($fmt, $($arg)*))
    };
}

/// Create an internal error with context
#[macro_export]
macro_rules! internal_error {
    ($msg:expr) => {
        $crate::error::LensError::InternalError($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::LensError::InternalError(format!($fmt, $($arg)*))
    };
}

/// Wrap an IO error with context
///
/// # Examples
/// ```ignore
/// let text = std::fs::read_to_string(path).map_err(|e| io_context(e, "reading bundle"))?;
/// ```
pub fn io_context(err: std::io::Error, msg: &str) -> LensError {
    LensError::IoError(std::io::Error::new(err.kind(), format!("{}: {}", msg, err)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(
            LensError::UnknownArchitecture("gfx000".to_string()).category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            LensError::MissingMetadataField("simd_per_cu").category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            LensError::DataNotFound("dispatch rows".to_string()).category(),
            ErrorCategory::DataNotFound
        );
        assert_eq!(
            LensError::InvalidTrace("end < start".to_string()).category(),
            ErrorCategory::Input
        );
        assert_eq!(
            LensError::InternalError("bug".to_string()).category(),
            ErrorCategory::Internal
        );
    }

    #[test]
    fn test_configuration_message_is_verbatim() {
        let err = LensError::UnknownArchitecture("gfx1200".to_string());
        assert_eq!(err.to_string(), "Unsupported architecture 'gfx1200'");

        let err = LensError::MissingMetadataField("max_clock_mhz");
        assert_eq!(
            err.to_string(),
            "Architecture metadata is missing required field 'max_clock_mhz'"
        );
    }

    #[test]
    fn test_predicates() {
        assert!(LensError::MissingMetadataField("wavefront_size").is_configuration_error());
        assert!(LensError::DataNotFound("timings".to_string()).is_data_not_found());
        assert!(!LensError::DataNotFound("timings".to_string()).is_configuration_error());
        assert!(LensError::InternalError("x".to_string()).is_internal_error());
    }

    #[test]
    fn test_macros() {
        let err = config_error!("bad value: {}", 3);
        assert_eq!(err.to_string(), "Invalid configuration: bad value: 3");

        let err = data_not_found!("no dispatch rows");
        assert!(matches!(err, LensError::DataNotFound(_)));

        let err = internal_error!("unreachable state");
        assert!(err.is_internal_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "bundle.json");
        let err: LensError = io_err.into();
        assert_eq!(err.category(), ErrorCategory::Io);

        let err = io_context(
            std::io::Error::new(std::io::ErrorKind::NotFound, "bundle.json"),
            "reading bundle",
        );
        assert!(err.to_string().contains("reading bundle"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: LensError = json_err.into();
        assert!(matches!(err, LensError::SerializationError(_)));
    }

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::Configuration.to_string(), "Configuration");
        assert_eq!(ErrorCategory::DataNotFound.to_string(), "DataNotFound");
        assert_eq!(ErrorCategory::Input.to_string(), "Input");
        assert_eq!(ErrorCategory::Io.to_string(), "Io");
        assert_eq!(ErrorCategory::Internal.to_string(), "Internal");
    }
}
