//! Store error handling
//!
//! Provides typed errors for record store operations with descriptive
//! messages and recovery suggestions.

use std::path::PathBuf;

use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors that can occur during record store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store cannot be reached (not opened, locked, read-only, closed)
    #[error("Storage unavailable: {details}")]
    Unavailable { details: String },

    /// Disk is full or quota exceeded
    #[error("Storage quota exceeded: {details}. Free up disk space and try again.")]
    QuotaExceeded { details: String },

    /// Failed to create the directory holding the database
    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stored record no longer parses as a Book
    #[error("Record '{id}' is corrupted: {source}")]
    CorruptRecord {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    /// A record could not be serialized for storage
    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Any other SQLite error
    #[error("Database error: {0}")]
    Database(#[source] rusqlite::Error),
}

impl From<rusqlite::Error> for StoreError {
    /// Classifies SQLite failures into the storage conditions callers act on
    fn from(error: rusqlite::Error) -> Self {
        let code = match &error {
            rusqlite::Error::SqliteFailure(failure, _) => Some(failure.code),
            _ => None,
        };

        match code {
            Some(ErrorCode::DiskFull) => StoreError::QuotaExceeded {
                details: error.to_string(),
            },
            Some(
                ErrorCode::CannotOpen
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::ReadOnly
                | ErrorCode::PermissionDenied,
            ) => StoreError::Unavailable {
                details: error.to_string(),
            },
            _ => StoreError::Database(error),
        }
    }
}

impl StoreError {
    /// Shorthand for an `Unavailable` error
    pub fn unavailable(details: impl Into<String>) -> Self {
        StoreError::Unavailable {
            details: details.into(),
        }
    }

    /// Shorthand for a `QuotaExceeded` error
    pub fn quota_exceeded(details: impl Into<String>) -> Self {
        StoreError::QuotaExceeded {
            details: details.into(),
        }
    }

    /// Check if this error is recoverable by the user
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StoreError::QuotaExceeded { .. }
                | StoreError::Unavailable { .. }
                | StoreError::CreateDirectory { .. }
        )
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StoreError::QuotaExceeded { .. } => Some("Free up disk space and try again."),
            StoreError::Unavailable { .. } => {
                Some("Make sure no other LaCa process holds the database and that the data directory is writable.")
            }
            StoreError::CreateDirectory { .. } => {
                Some("Check that the parent directory exists and you have write permissions.")
            }
            StoreError::CorruptRecord { .. } => {
                Some("Delete the damaged record with `laca book delete <id>` or restore it from a backup.")
            }
            _ => None,
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_failure(code: ErrorCode, extended_code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code,
                extended_code,
            },
            None,
        )
    }

    #[test]
    fn test_disk_full_classification() {
        let err: StoreError = sqlite_failure(ErrorCode::DiskFull, 13).into();
        assert!(matches!(err, StoreError::QuotaExceeded { .. }));
        assert!(err.is_recoverable());
        assert!(err.recovery_suggestion().is_some());
    }

    #[test]
    fn test_busy_classification() {
        let err: StoreError = sqlite_failure(ErrorCode::DatabaseBusy, 5).into();
        assert!(matches!(err, StoreError::Unavailable { .. }));
    }

    #[test]
    fn test_other_errors_stay_database() {
        let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StoreError::Database(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let err = StoreError::unavailable("store is closed");
        let msg = err.to_string();
        assert!(msg.contains("unavailable"));
        assert!(msg.contains("store is closed"));
    }
}
