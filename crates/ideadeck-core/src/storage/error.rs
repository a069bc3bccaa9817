//! Storage error handling
//!
//! Provides typed errors for card store operations with descriptive
//! messages and recovery suggestions.

use std::io;
use std::path::PathBuf;

use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors that can occur during card store operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// The database cannot be opened, initialized or read
    #[error("Card database at '{path}' is unavailable: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: UnavailableReason,
    },

    /// A create/update/delete write failed
    #[error("Failed to {operation} card: {source}")]
    Write {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// No card with the given id exists
    #[error("Card not found: '{id}'")]
    NotFound { id: String },

    /// A stored row could not be decoded
    #[error("Stored card '{id}' is invalid: {details}")]
    InvalidRecord { id: String, details: String },

    /// The blocking database worker did not complete
    #[error("Storage worker failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// Underlying cause of [`StorageError::Unavailable`]
#[derive(Error, Debug)]
pub enum UnavailableReason {
    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Database(#[from] rusqlite::Error),

    #[error("schema version {found} is newer than supported version {supported}")]
    UnsupportedSchema { found: i32, supported: i32 },
}

impl StorageError {
    /// Wrap an open/read failure with the database path
    pub fn unavailable(path: impl Into<PathBuf>, source: impl Into<UnavailableReason>) -> Self {
        StorageError::Unavailable {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Wrap a failed write with the operation that issued it
    pub fn write(operation: &'static str, source: rusqlite::Error) -> Self {
        StorageError::Write { operation, source }
    }

    /// True if a write was rejected because the id already exists
    pub fn is_id_collision(&self) -> bool {
        match self {
            StorageError::Write {
                source: rusqlite::Error::SqliteFailure(err, _),
                ..
            } => {
                err.code == ErrorCode::ConstraintViolation
                    && err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            }
            _ => false,
        }
    }

    /// Check if this error is recoverable by the user
    pub fn is_recoverable(&self) -> bool {
        match self {
            StorageError::Unavailable { source, .. } => matches!(
                source,
                UnavailableReason::Io(e) if e.kind() == io::ErrorKind::PermissionDenied
            ),
            StorageError::Write { source, .. } => is_disk_full(source),
            StorageError::NotFound { .. } => true,
            _ => false,
        }
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StorageError::Unavailable {
                source: UnavailableReason::UnsupportedSchema { .. },
                ..
            } => Some(
                "The database was written by a newer version of IdeaDeck. Upgrade and try again.",
            ),
            StorageError::Unavailable { .. } => {
                Some("Check that the data directory exists and you have read/write permissions.")
            }
            StorageError::Write { source, .. } if is_disk_full(source) => {
                Some("Free up disk space, or use a smaller image, and try again.")
            }
            StorageError::NotFound { .. } => {
                Some("List cards with `ideadeck list` to find a valid id.")
            }
            _ => None,
        }
    }
}

fn is_disk_full(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::DiskFull
    )
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_failure(code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(code), None)
    }

    #[test]
    fn test_id_collision_detection() {
        let err = StorageError::write(
            "create",
            sqlite_failure(rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY),
        );
        assert!(err.is_id_collision());

        let other = StorageError::write("create", sqlite_failure(rusqlite::ffi::SQLITE_FULL));
        assert!(!other.is_id_collision());
    }

    #[test]
    fn test_disk_full_is_recoverable() {
        let err = StorageError::write("create", sqlite_failure(rusqlite::ffi::SQLITE_FULL));
        assert!(err.is_recoverable());
        assert!(err.recovery_suggestion().unwrap().contains("smaller image"));
    }

    #[test]
    fn test_permission_denied_is_recoverable() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err = StorageError::unavailable("/test/cards.sqlite", io_err);

        assert!(err.is_recoverable());
        assert!(err.recovery_suggestion().is_some());
    }

    #[test]
    fn test_unsupported_schema_display() {
        let err = StorageError::unavailable(
            "/data/ideadeck_db.sqlite",
            UnavailableReason::UnsupportedSchema {
                found: 3,
                supported: 1,
            },
        );

        let msg = err.to_string();
        assert!(msg.contains("unavailable"));
        assert!(msg.contains("/data/ideadeck_db.sqlite"));
        assert!(!err.is_recoverable());
        assert!(err.recovery_suggestion().unwrap().contains("newer version"));
    }

    #[test]
    fn test_not_found_display() {
        let err = StorageError::NotFound {
            id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Card not found: 'abc'");
    }
}
