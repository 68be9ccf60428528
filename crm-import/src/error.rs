//! Error types for the bulk import engine
//!
//! Validation errors stop a run before anything is persisted. Every other
//! variant is an infrastructure failure that aborts the run. Row-level insert
//! failures are not errors; they are reported in the import summary.

use thiserror::Error;

/// Import error type
#[derive(Debug, Error)]
pub enum ImportError {
    /// Bad input: malformed mapping, empty sheet, no valid rows, ...
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Persistence store unavailable or misbehaving
    #[error("Store failure: {0}")]
    Store(#[from] crm_common::Error),

    /// Durable storage (summary artifact) could not be written
    #[error("Storage failure: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Background task failed to complete
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ImportError {
    pub fn validation(message: impl Into<String>) -> Self {
        ImportError::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ImportError::Validation(_))
    }

    /// Stable code for machine-readable output
    pub fn error_code(&self) -> &'static str {
        match self {
            ImportError::Validation(_) => "VALIDATION_ERROR",
            ImportError::Store(_) => "STORE_ERROR",
            ImportError::Storage(_) => "STORAGE_ERROR",
            ImportError::Io(_) => "IO_ERROR",
            ImportError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<sqlx::Error> for ImportError {
    fn from(err: sqlx::Error) -> Self {
        ImportError::Store(crm_common::Error::Database(err))
    }
}

/// Result type for import operations
pub type ImportResult<T> = Result<T, ImportError>;
