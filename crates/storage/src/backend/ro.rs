//! Read-only storage backend.
//!
//! This module provides a storage backend implementation that wraps other
//! implementations and refuses to execute write operations.

use crate::error::{ErrorKind, Result};
use crate::key::validate as validate_key;
use crate::{BackendHandle, StorageBackend};

/// Read-only storage backend.
///
/// Wraps another backend and fails every write or delete with
/// [`ReadOnly`](ErrorKind::ReadOnly), logging a warning. Useful to inspect a
/// library without any risk of modifying it, and to exercise the
/// memory-only fallback of anything persisting through a
/// [`Gateway`](crate::Gateway).
#[derive(Clone)]
pub struct ReadOnlyBackend {
    inner: BackendHandle,
}
impl ReadOnlyBackend {
    pub fn new(inner: BackendHandle) -> Self {
        Self { inner }
    }
}

impl StorageBackend for ReadOnlyBackend {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn keys(&self, prefix: Option<&str>) -> Result<Vec<String>> {
        self.inner.keys(prefix)
    }

    fn exists(&self, key: &str) -> Result<bool> {
        self.inner.exists(key)
    }

    fn read(&self, key: &str) -> Result<Vec<u8>> {
        self.inner.read(key)
    }

    fn write(&self, key: &str, data: &[u8]) -> Result<()> {
        let key = validate_key(key)?;
        tracing::warn!(
            backend = self.inner.name(),
            key = %key,
            bytes = data.len(),
            "Refusing write to read-only backend"
        );
        exn::bail!(ErrorKind::ReadOnly(key))
    }

    fn delete(&self, key: &str) -> Result<()> {
        let key = validate_key(key)?;
        tracing::warn!(backend = self.inner.name(), key = %key, "Refusing delete from read-only backend");
        exn::bail!(ErrorKind::ReadOnly(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use std::sync::Arc;

    #[test]
    fn test_reads_pass_through() {
        let inner: BackendHandle = Arc::new(MemoryBackend::with_values([("ns:key", b"original".to_vec())]));
        let backend = ReadOnlyBackend::new(inner);
        assert_eq!(backend.read("ns:key").unwrap(), b"original");
        assert!(backend.exists("ns:key").unwrap());
        assert_eq!(backend.keys(Some("ns")).unwrap(), ["ns:key"]);
        assert_eq!(backend.name(), "memory");
    }

    #[test]
    fn test_writes_are_refused() {
        let inner: BackendHandle = Arc::new(MemoryBackend::with_values([("ns:key", b"original".to_vec())]));
        let backend = ReadOnlyBackend::new(Arc::clone(&inner));
        let err = backend.write("ns:key", b"changed").unwrap_err();
        assert!(matches!(&*err, ErrorKind::ReadOnly(_)));
        let err = backend.delete("ns:key").unwrap_err();
        assert!(matches!(&*err, ErrorKind::ReadOnly(_)));
        assert_eq!(inner.read("ns:key").unwrap(), b"original");
    }
}
