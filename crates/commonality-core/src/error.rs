//! Error types for Commonality

use thiserror::Error;

use crate::logging::SessionId;

/// Main error type for Commonality operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// General I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Session was not found in the log store
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    /// A stored log name does not decode back into a session identifier
    #[error("Malformed session name: {0}")]
    MalformedSessionName(String),

    /// Timestamp cannot be represented as a session identifier
    #[error("Timestamp out of range: {0}")]
    TimestampOutOfRange(String),

    /// Requested service was never registered
    #[error("Service {0} not found")]
    ServiceNotFound(&'static str),

    /// Format string could not be applied
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Index outside the bounds of a collection
    #[error("Index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Result type alias using CoreError
pub type CoreResult<T> = Result<T, CoreError>;
