//! Core error types.
//!
//! These are storage-agnostic. The storage layer converts Diesel and pool
//! errors into [`DatabaseError`] before they reach the engine.

use thiserror::Error;

use crate::prices::SourceError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Source operation failed: {0}")]
    Source(#[from] SourceError),

    /// No client is registered for the requested source.
    #[error("Unknown source '{0}'")]
    UnknownSource(String),

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),

    /// A store call did not finish within the configured bound.
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Storage failures in string form.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    #[error("Database query failed: {0}")]
    QueryFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    /// A second row for an existing `(source, start_timestamp)` key.
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// The write could not be committed, including an unavailable writer.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    #[error("Internal database error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_keeps_its_message() {
        let err: Error = SourceError::fetch("AWATTAR", "connection reset").into();
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_timeout_display() {
        let err = Error::Timeout(std::time::Duration::from_secs(30));
        assert_eq!(err.to_string(), "Operation timed out after 30s");
    }
}
