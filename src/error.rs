//! Error types for HomeLib
//!
//! This module defines error types using thiserror for ergonomic error handling.
//! Errors are grouped by where they originate (storage, session, configuration).
//!
//! ## Error taxonomy
//!
//! ### Storage unavailable
//! - Database file cannot be created or opened → `FileIoError`, `SqlxError`
//! - Schema bootstrap fails → `MigrationFailed`
//!
//! ### Constraint violations
//! - Unique names, rating range, NOT NULL → `SqlxError` (via `#[from]`),
//!   carrying the engine message verbatim. Use `is_constraint_violation()`
//!   to classify them.
//!
//! ### Not found
//! - Single-record lookups return `Ok(None)`; there is no not-found variant
//!   for them.
//!
//! ### Session and input
//! - Admin-gated actions → `PermissionDenied`
//! - Unknown book status, empty login fields → `InvalidInput`
//!
//! ### Configuration
//! - Unparsable environment values → `ConfigurationError`

use thiserror::Error;

/// Result type alias using our LibraryError type
pub type Result<T> = std::result::Result<T, LibraryError>;

/// Main error type for HomeLib
#[derive(Error, Debug)]
pub enum LibraryError {
    // ===== Database Errors =====

    /// Database schema migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    // ===== File/Storage Errors =====

    /// Generic file I/O error (database directory, database file)
    #[error("File I/O error: {0}")]
    FileIoError(String),

    // ===== Validation/Session Errors =====

    /// Generic input validation error
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The acting session is not allowed to perform the operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Configuration is invalid or incomplete
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ===== External Library Errors =====

    /// Database driver error from sqlx
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),
}

impl LibraryError {
    /// Create an InvalidInput error with a message
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        LibraryError::InvalidInput(message.into())
    }

    /// Create a PermissionDenied error with a message
    pub fn permission_denied<S: Into<String>>(message: S) -> Self {
        LibraryError::PermissionDenied(message.into())
    }

    /// Check if the storage engine rejected a write because of a constraint
    ///
    /// Covers UNIQUE, CHECK, NOT NULL and FOREIGN KEY failures. The error
    /// itself is left untouched so the engine message reaches the caller.
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            LibraryError::SqlxError(sqlx::Error::Database(db_err)) => {
                matches!(
                    db_err.kind(),
                    sqlx::error::ErrorKind::UniqueViolation
                        | sqlx::error::ErrorKind::CheckViolation
                        | sqlx::error::ErrorKind::NotNullViolation
                        | sqlx::error::ErrorKind::ForeignKeyViolation
                ) || db_err.message().contains("constraint failed")
            }
            _ => false,
        }
    }

    /// Check if the database could not be opened or reached
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(
            self,
            LibraryError::FileIoError(_)
                | LibraryError::MigrationFailed(_)
                | LibraryError::SqlxError(
                    sqlx::Error::Io(_)
                        | sqlx::Error::PoolClosed
                        | sqlx::Error::PoolTimedOut
                        | sqlx::Error::Configuration(_)
                )
        )
    }

    /// Get user-friendly error message suitable for display
    pub fn user_message(&self) -> String {
        match self {
            LibraryError::PermissionDenied(message) => {
                format!("You are not allowed to do this: {}", message)
            }
            LibraryError::SqlxError(sqlx::Error::Database(db_err)) => {
                format!("The library database rejected the change: {}", db_err.message())
            }
            err if err.is_storage_unavailable() => {
                format!("The library database is not available: {}", err)
            }
            _ => self.to_string(),
        }
    }
}
