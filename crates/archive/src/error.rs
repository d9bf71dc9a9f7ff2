//! Archive Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An archive error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The bytes are not a well-formed zip container (or an entry could not
    /// be decompressed). Don't retry with the same input.
    #[display("corrupt archive: not a readable zip container")]
    CorruptArchive,
    /// The container is valid but holds no recognized page images.
    #[display("archive contains no pages")]
    EmptyArchive,
    /// The selected file does not carry the archive extension.
    #[display("unsupported file: {_0}")]
    UnsupportedFile(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // The archive is either readable or it isn't.
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::EmptyArchive.to_string(), "archive contains no pages");
        assert_eq!(ErrorKind::UnsupportedFile("notes.txt".to_string()).to_string(), "unsupported file: notes.txt");
    }

    #[test]
    fn nothing_is_retryable() {
        assert!(!ErrorKind::CorruptArchive.is_retryable());
        assert!(!ErrorKind::EmptyArchive.is_retryable());
    }
}
