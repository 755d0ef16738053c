//! Error types for the import engine.
//!
//! Row-level validation problems are not errors: they are returned as data
//! in a [`ValidationResult`](crate::validation::ValidationResult). The types
//! here cover malformed input, configuration mistakes and storage failures.

use arbor_persistence::StorageError;
use thiserror::Error;

/// Errors raised while reading, validating or applying an upload.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The input file is not well-formed CSV.
    #[error("malformed CSV input: {0}")]
    Csv(#[from] csv::Error),

    /// A column every upload must carry is absent from the header.
    #[error("CSV input is missing the required '{column}' column")]
    MissingColumn {
        /// Normalized name of the missing column.
        column: String,
    },

    /// The upload transaction failed and was rolled back.
    #[error("upload processing failed: {message}")]
    Processing {
        /// Message of the underlying failure.
        message: String,
        /// The storage error that caused the rollback.
        #[source]
        source: StorageError,
    },

    /// A storage error outside a write transaction.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The import configuration is invalid.
    #[error("invalid import configuration: {}", .0.join("; "))]
    Config(Vec<String>),
}

impl ImportError {
    /// Wraps a storage failure that forced a rollback.
    pub fn processing(source: StorageError) -> Self {
        ImportError::Processing {
            message: source.to_string(),
            source,
        }
    }
}

/// Error returned by an [`UploadNotifier`](crate::notify::UploadNotifier).
#[derive(Error, Debug)]
#[error("notification failed: {message}")]
pub struct NotifyError {
    /// Description of the delivery failure.
    pub message: String,
}

impl NotifyError {
    /// Creates a notification error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result type alias for import operations.
pub type ImportResult<T> = Result<T, ImportError>;
