//! Storage Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Every kind here is what the rest of the workspace calls a *storage error*:
//! the persistence layer couldn't do what was asked. Callers are expected to
//! degrade (keep working in memory) rather than surface these to a user.

use derive_more::{Display, Error};
use std::io::Error as IoError;

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Key does not exist
    #[display("key not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// Access denied by the operating system
    #[display("permission denied: {_0}")]
    PermissionDenied(#[error(not(source))] String),
    /// Key is empty, contains invalid characters or a relative segment
    #[display("invalid key: {_0}")]
    InvalidKey(#[error(not(source))] String),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// The backend has no room left for the value
    #[display("storage full, cannot write: {_0}")]
    Full(#[error(not(source))] String),
    /// The backend refuses modifications
    #[display("backend is read-only, cannot modify: {_0}")]
    ReadOnly(#[error(not(source))] String),
    /// Backend-specific error
    #[display("backend error: {_0}")]
    BackendError(#[error(not(source))] String),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::BackendError(_))
    }
}
