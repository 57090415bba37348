//! Error types for printspec.
//!
//! Specification violations are never errors: they are reported as
//! [`ValidationIssue`](crate::validation::ValidationIssue)s inside a report.
//! The variants here cover the conditions that stop an item (or the whole
//! run) from being validated at all.
//!
//! # Error Categories
//!
//! - **Input Errors**: file not found, unreadable, unknown type
//! - **Decode Errors**: bytes that cannot be parsed as the declared type
//! - **Configuration Errors**: invalid sizes, margins, thresholds
//! - **Processing Errors**: deadline overruns and worker failures

use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Result type alias for printspec operations.
pub type Result<T> = std::result::Result<T, PrintSpecError>;

/// Main error type for printspec operations.
#[derive(Debug, thiserror::Error)]
pub enum PrintSpecError {
    /// Input file was not found.
    #[error("File not found: {}", .path.display())]
    FileNotFound {
        /// Path to the file that was not found.
        path: PathBuf,
    },

    /// Input file exists but cannot be read.
    #[error("Cannot access file: {}\n  Reason: {source}", .path.display())]
    FileNotAccessible {
        /// Path to the inaccessible file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Input path is a directory.
    #[error("Not a file: {}", .path.display())]
    NotAFile {
        /// Path that is not a file.
        path: PathBuf,
    },

    /// Input is neither a PDF nor a supported raster image.
    #[error("Unsupported input type: {name}\n  Hint: expected a PDF, PNG, JPEG, TIFF, BMP, GIF or WebP file")]
    UnsupportedInput {
        /// Item name.
        name: String,
    },

    /// Document bytes could not be parsed.
    #[error("Failed to decode document: {name}\n  Reason: {reason}")]
    DocumentDecode {
        /// Item name.
        name: String,
        /// Reason for the failure.
        reason: String,
    },

    /// Raster bytes could not be parsed.
    #[error("Failed to decode image: {name}\n  Reason: {reason}")]
    RasterDecode {
        /// Item name.
        name: String,
        /// Reason for the failure.
        reason: String,
    },

    /// Document is encrypted and cannot be inspected.
    #[error("Document is encrypted and cannot be inspected: {name}\n  Hint: Decrypt the PDF first using 'qpdf --decrypt' or similar tools")]
    EncryptedDocument {
        /// Item name.
        name: String,
    },

    /// Validation of a single item exceeded its deadline.
    #[error("Validation of {name} exceeded the {:.1}s deadline", .deadline.as_secs_f64())]
    DeadlineExceeded {
        /// Item name.
        name: String,
        /// Configured deadline.
        deadline: Duration,
    },

    /// The worker validating an item stopped unexpectedly.
    #[error("Validation worker for {name} failed: {reason}")]
    WorkerFailed {
        /// Item name.
        name: String,
        /// Details about the failure.
        reason: String,
    },

    /// No input items were supplied.
    #[error("No input files specified for validation")]
    NoInputs,

    /// Failed to read the input list file.
    #[error("Failed to read input list file: {}\n  Reason: {source}", .path.display())]
    FailedToReadInputList {
        /// Path to the input list file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Input list file contains an invalid entry.
    #[error("Invalid entry in input list file: {} at line {line_number}\n  Details: {details}", .path.display())]
    InvalidInputList {
        /// Path to the input list file.
        path: PathBuf,
        /// Line number with the error.
        line_number: usize,
        /// Details about what's invalid.
        details: String,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// Failed to render a report.
    #[error("Failed to render report: {0}")]
    Render(#[from] serde_json::Error),

    /// Generic I/O error.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// Generic error with a custom message.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl From<anyhow::Error> for PrintSpecError {
    fn from(err: anyhow::Error) -> Self {
        Self::other(format!("{err:#}"))
    }
}

impl PrintSpecError {
    /// Create a FileNotFound error.
    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    /// Create a NotAFile error.
    pub fn not_a_file(path: PathBuf) -> Self {
        Self::NotAFile { path }
    }

    /// Create an UnsupportedInput error.
    pub fn unsupported_input(name: impl Into<String>) -> Self {
        Self::UnsupportedInput { name: name.into() }
    }

    /// Create a DocumentDecode error.
    pub fn document_decode(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DocumentDecode {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a RasterDecode error.
    pub fn raster_decode(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RasterDecode {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Check if this error is confined to a single item.
    ///
    /// Item-level failures become a failed report with a `processing`
    /// issue; every other error stops the run.
    pub fn is_processing_failure(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound { .. }
                | Self::FileNotAccessible { .. }
                | Self::NotAFile { .. }
                | Self::UnsupportedInput { .. }
                | Self::DocumentDecode { .. }
                | Self::RasterDecode { .. }
                | Self::EncryptedDocument { .. }
                | Self::DeadlineExceeded { .. }
                | Self::WorkerFailed { .. }
        )
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FileNotFound { .. } => 2,
            Self::FileNotAccessible { .. } => 2,
            Self::NotAFile { .. } => 2,
            Self::UnsupportedInput { .. } => 3,
            Self::DocumentDecode { .. } => 3,
            Self::RasterDecode { .. } => 3,
            Self::EncryptedDocument { .. } => 3,
            Self::DeadlineExceeded { .. } => 3,
            Self::WorkerFailed { .. } => 3,
            Self::NoInputs => 1,
            Self::FailedToReadInputList { .. } => 2,
            Self::InvalidInputList { .. } => 1,
            Self::InvalidConfig { .. } => 1,
            Self::Render(_) => 5,
            Self::Io { .. } => 5,
            Self::Other { .. } => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_file_not_found_display() {
        let err = PrintSpecError::file_not_found(PathBuf::from("/tmp/missing.pdf"));
        let msg = err.to_string();
        assert!(msg.contains("File not found"));
        assert!(msg.contains("missing.pdf"));
    }

    #[test]
    fn test_document_decode_display() {
        let err = PrintSpecError::document_decode("bad.pdf", "invalid file header");
        let msg = err.to_string();
        assert!(msg.contains("Failed to decode document"));
        assert!(msg.contains("bad.pdf"));
        assert!(msg.contains("invalid file header"));
    }

    #[test]
    fn test_encrypted_display_has_hint() {
        let err = PrintSpecError::EncryptedDocument {
            name: "secret.pdf".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("encrypted"));
        assert!(msg.contains("Decrypt"));
    }

    #[test]
    fn test_deadline_display() {
        let err = PrintSpecError::DeadlineExceeded {
            name: "huge.pdf".to_string(),
            deadline: Duration::from_millis(2500),
        };
        assert!(err.to_string().contains("2.5s"));
    }

    #[test]
    fn test_is_processing_failure() {
        assert!(PrintSpecError::document_decode("a.pdf", "x").is_processing_failure());
        assert!(PrintSpecError::raster_decode("a.png", "x").is_processing_failure());
        assert!(PrintSpecError::unsupported_input("a.txt").is_processing_failure());

        assert!(!PrintSpecError::NoInputs.is_processing_failure());
        assert!(!PrintSpecError::invalid_config("bad").is_processing_failure());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(PrintSpecError::file_not_found(PathBuf::from("x")).exit_code(), 2);
        assert_eq!(PrintSpecError::document_decode("x", "y").exit_code(), 3);
        assert_eq!(PrintSpecError::NoInputs.exit_code(), 1);
        assert_eq!(PrintSpecError::invalid_config("x").exit_code(), 1);
    }

    #[test]
    fn test_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "not found");
        let err: PrintSpecError = io_err.into();
        assert!(matches!(err, PrintSpecError::Io { .. }));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_from_anyhow_keeps_context() {
        let err = anyhow::anyhow!("root cause").context("reading config");
        let err: PrintSpecError = err.into();
        let msg = err.to_string();
        assert!(msg.contains("reading config"));
        assert!(msg.contains("root cause"));
    }
}
