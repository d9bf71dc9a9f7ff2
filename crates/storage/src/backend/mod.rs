//! Storage backend trait and implementations.
//!
//! This module defines the `StorageBackend` trait, a unified key/value
//! interface over the different places persisted state can live (process
//! memory, the local filesystem, ...).

mod local;
mod memory;
mod ro;

pub use self::local::LocalBackend;
pub use self::memory::MemoryBackend;
pub use self::ro::ReadOnlyBackend;
use crate::error::{ErrorKind, Result};

/// Unified interface for key/value storage backends.
///
/// Operations are synchronous: values are small and every write must be
/// durable by the time the call returns, so that a read straight after it
/// observes the change. It's a glorified CRUD interface.
///
/// # Keys
/// All keys must be validated using [`validate_key`](crate::validate_key)
/// before use. Implementations should enforce this validation.
///
/// # Examples
///
/// ```
/// use koma_storage::{StorageBackend, error::Result};
///
/// fn size_of_library(backend: &dyn StorageBackend) -> Result<usize> {
///     if backend.exists("manga-reader:library")? {
///         Ok(backend.read("manga-reader:library")?.len())
///     } else {
///         Ok(0)
///     }
/// }
/// ```
pub trait StorageBackend: Send + Sync {
    /// Name of the configured backend, used for logging only.
    fn name(&self) -> &str;

    /// List all keys, optionally only those under a (segment-wise) prefix.
    ///
    /// Keys are returned in ascending order.
    fn keys(&self, prefix: Option<&str>) -> Result<Vec<String>>;

    /// Check if a key exists.
    fn exists(&self, key: &str) -> Result<bool>;

    /// Read a value.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the key
    /// does not exist.
    fn read(&self, key: &str) -> Result<Vec<u8>>;

    /// Write a value, creating or replacing it.
    fn write(&self, key: &str, data: &[u8]) -> Result<()>;

    /// Delete a value.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the key
    /// does not exist.
    fn delete(&self, key: &str) -> Result<()>;
}

/// Returns `true` for the error every backend raises on a missing key.
pub fn is_not_found(err: &crate::error::Error) -> bool {
    matches!(&**err, ErrorKind::NotFound(_))
}
