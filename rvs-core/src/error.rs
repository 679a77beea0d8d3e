//! Error types for RVS operations
//!
//! Only the administrative, export, configuration and file paths return
//! errors. The ipoint fast path never constructs one: a filtered or dropped
//! ipoint is not a failure.
//!
//! # Error Codes
//!
//! Each error variant has a stable error code (e.g., `INVALID_DESTINATION`)
//! and maps to a POSIX errno for the C ABI, which returns `-errno`.
//!
//! # Example
//!
//! ```rust
//! use rvs_core::error::{RVSError, ErrorCategory};
//!
//! let err = RVSError::InvalidDestination {
//!     reason: "null pointer".to_string(),
//! };
//! assert_eq!(err.category(), ErrorCategory::Validation);
//! assert_eq!(err.error_code(), "INVALID_DESTINATION");
//! assert_eq!(err.errno(), libc::EFAULT);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for RVS operations
pub type Result<T> = std::result::Result<T, RVSError>;

/// Error category for grouping related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Caller supplied bad input (config, destination, trace bytes)
    Validation,
    /// Operation not valid in the current lifecycle state
    State,
    /// I/O or serialization failure outside the tracer
    External,
}

/// Errors that can occur in RVS operations
#[derive(Error, Debug)]
pub enum RVSError {
    // ═══════════════════════════════════════════════════════════════════════
    // Configuration errors
    // ═══════════════════════════════════════════════════════════════════════

    /// Trace configuration failed validation
    #[error("Invalid trace configuration: {reason}")]
    InvalidConfig { reason: String },

    // ═══════════════════════════════════════════════════════════════════════
    // Singleton lifecycle errors
    // ═══════════════════════════════════════════════════════════════════════

    /// The process-wide tracer was already constructed
    #[error("Tracer already installed. The process-wide tracer is constructed once at startup.")]
    AlreadyInstalled,

    /// The process-wide tracer has not been constructed yet
    #[error("Tracer not installed. Call install() before using the global control surface.")]
    NotInstalled,

    // ═══════════════════════════════════════════════════════════════════════
    // Export errors
    // ═══════════════════════════════════════════════════════════════════════

    /// Download destination is null or not addressable
    #[error("Invalid download destination: {reason}")]
    InvalidDestination { reason: String },

    /// Download destination is not aligned for trace records
    #[error("Download destination {address:#x} is not aligned to {align} bytes")]
    MisalignedDestination { address: usize, align: usize },

    /// A trace file does not consist of whole fixed-width records
    #[error("Malformed trace data: {reason}")]
    MalformedTrace { reason: String },

    // ═══════════════════════════════════════════════════════════════════════
    // Infrastructure errors
    // ═══════════════════════════════════════════════════════════════════════

    /// JSON serialization or deserialization failed
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// I/O operation failed
    #[error("IO error: {message}")]
    IoError { message: String },
}

impl From<std::io::Error> for RVSError {
    fn from(err: std::io::Error) -> Self {
        RVSError::IoError {
            message: err.to_string(),
        }
    }
}

impl RVSError {
    /// Returns the error category for grouping
    pub fn category(&self) -> ErrorCategory {
        match self {
            RVSError::InvalidConfig { .. }
            | RVSError::InvalidDestination { .. }
            | RVSError::MisalignedDestination { .. }
            | RVSError::MalformedTrace { .. } => ErrorCategory::Validation,

            RVSError::AlreadyInstalled | RVSError::NotInstalled => ErrorCategory::State,

            RVSError::JsonError(_) | RVSError::IoError { .. } => ErrorCategory::External,
        }
    }

    /// Returns the stable error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            RVSError::InvalidConfig { .. } => "INVALID_CONFIG",
            RVSError::AlreadyInstalled => "ALREADY_INSTALLED",
            RVSError::NotInstalled => "NOT_INSTALLED",
            RVSError::InvalidDestination { .. } => "INVALID_DESTINATION",
            RVSError::MisalignedDestination { .. } => "MISALIGNED_DESTINATION",
            RVSError::MalformedTrace { .. } => "MALFORMED_TRACE",
            RVSError::JsonError(_) => "JSON_ERROR",
            RVSError::IoError { .. } => "IO_ERROR",
        }
    }

    /// Returns the positive POSIX errno for this error
    ///
    /// The C ABI reports failures as the negated value.
    pub fn errno(&self) -> i32 {
        match self {
            RVSError::InvalidConfig { .. }
            | RVSError::MisalignedDestination { .. }
            | RVSError::MalformedTrace { .. } => libc::EINVAL,
            RVSError::AlreadyInstalled => libc::EBUSY,
            RVSError::NotInstalled => libc::ENODEV,
            RVSError::InvalidDestination { .. } => libc::EFAULT,
            RVSError::JsonError(_) | RVSError::IoError { .. } => libc::EIO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(RVSError::AlreadyInstalled.error_code(), "ALREADY_INSTALLED");
        assert_eq!(
            RVSError::InvalidConfig {
                reason: "zero capacity".to_string()
            }
            .error_code(),
            "INVALID_CONFIG"
        );
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(RVSError::NotInstalled.category(), ErrorCategory::State);
        assert_eq!(
            RVSError::MalformedTrace {
                reason: "trailing bytes".to_string()
            }
            .category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            RVSError::IoError {
                message: "disk".to_string()
            }
            .category(),
            ErrorCategory::External
        );
    }

    #[test]
    fn test_errno_mapping() {
        assert_eq!(
            RVSError::InvalidDestination {
                reason: "null".to_string()
            }
            .errno(),
            libc::EFAULT
        );
        assert_eq!(
            RVSError::MisalignedDestination {
                address: 0x1002,
                align: 4
            }
            .errno(),
            libc::EINVAL
        );
        assert_eq!(RVSError::AlreadyInstalled.errno(), libc::EBUSY);
        assert!(RVSError::NotInstalled.errno() > 0);
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "trace.bin missing");
        let err: RVSError = io.into();
        assert_eq!(err.error_code(), "IO_ERROR");
        assert!(err.to_string().contains("trace.bin missing"));
    }
}
