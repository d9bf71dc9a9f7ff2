//! Reader Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Out-of-range navigation is never an error (it's clamped or ignored), and
//! storage failures are absorbed by the library store.

use derive_more::{Display, Error};
use koma_archive::error::{Error as ArchiveError, ErrorKind as ArchiveErrorKind};
use koma_archive::models::MangaId;

/// A reader error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for reader operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The supplied bytes are not a readable archive.
    #[display("corrupt archive")]
    CorruptArchive,
    /// The archive holds no page images.
    #[display("archive contains no pages")]
    EmptyArchive,
    /// The selected file isn't a comic archive.
    #[display("unsupported file: {_0}")]
    UnsupportedFile(#[error(not(source))] String),
    /// Another archive is still being loaded.
    #[display("an archive is already loading")]
    Busy,
    #[display("unknown manga: {_0}")]
    UnknownManga(#[error(not(source))] MangaId),
    /// The manga is in the library but its pages aren't held by the session
    /// (the archive has to be selected again).
    #[display("archive not available for manga {_0}, load it again")]
    ArchiveUnavailable(#[error(not(source))] MangaId),
    /// The extraction task stopped without a result.
    #[display("archive loading interrupted")]
    Interrupted,
}
impl ErrorKind {
    /// Convert an archive error into a reader error, keeping the archive
    /// crate's frame as a child in the error tree.
    #[track_caller]
    pub fn archive(err: ArchiveError) -> Error {
        let kind = match &*err {
            ArchiveErrorKind::CorruptArchive => Self::CorruptArchive,
            ArchiveErrorKind::EmptyArchive => Self::EmptyArchive,
            ArchiveErrorKind::UnsupportedFile(name) => Self::UnsupportedFile(name.clone()),
        };
        err.raise(kind)
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy | Self::Interrupted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_conversion() {
        let err = ErrorKind::archive(ArchiveError::from(ArchiveErrorKind::EmptyArchive));
        assert_eq!(*err, ErrorKind::EmptyArchive);
        let err = ErrorKind::archive(ArchiveError::from(ArchiveErrorKind::UnsupportedFile("a.txt".to_string())));
        assert_eq!(*err, ErrorKind::UnsupportedFile("a.txt".to_string()));
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorKind::Busy.is_retryable());
        assert!(!ErrorKind::CorruptArchive.is_retryable());
        assert!(!ErrorKind::UnknownManga(MangaId::new("1")).is_retryable());
    }
}
