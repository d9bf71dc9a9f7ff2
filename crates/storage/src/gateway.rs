//! Namespaced access to a storage backend.

use crate::backend::is_not_found;
use crate::error::{ErrorKind, Result};
use crate::key::{SEPARATOR, validate as validate_key};
use crate::BackendHandle;
use exn::ResultExt;
use tracing::instrument;

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "manga-reader";

/// The single way the rest of the workspace reads and writes persisted
/// state.
///
/// Every key is prefixed with `<namespace>:` before it reaches the backend,
/// so several applications (or several profiles of this one) can share a
/// backend. Cloning is cheap: the backend is reference counted.
///
/// # Examples
///
/// ```
/// use koma_storage::{Gateway, backend::MemoryBackend};
/// use std::sync::Arc;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = Arc::new(MemoryBackend::default());
/// let gateway = Gateway::new(backend.clone(), "manga-reader")?;
/// gateway.write("theme", b"dark")?;
/// assert_eq!(gateway.read("theme")?, Some(b"dark".to_vec()));
/// assert_eq!(gateway.read("missing")?, None);
/// # use koma_storage::StorageBackend;
/// assert!(backend.exists("manga-reader:theme")?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Gateway {
    backend: BackendHandle,
    namespace: String,
}
impl Gateway {
    /// Bind a backend to a namespace.
    ///
    /// Returns [`InvalidKey`](ErrorKind::InvalidKey) if the namespace can't
    /// be used as a key prefix.
    pub fn new(backend: BackendHandle, namespace: impl Into<String>) -> Result<Self> {
        let namespace = validate_key(namespace.into())?;
        Ok(Self { backend, namespace })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    fn full_key(&self, key: &str) -> Result<String> {
        validate_key(format!("{}{SEPARATOR}{key}", self.namespace))
    }

    /// Read a value; a missing key is `None`, not an error.
    #[instrument(skip(self), fields(namespace = %self.namespace))]
    pub fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let full = self.full_key(key)?;
        match self.backend.read(&full) {
            Ok(data) => Ok(Some(data)),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Write a value. The value is durable once this returns.
    #[instrument(skip(self, data), fields(namespace = %self.namespace, bytes = data.len()))]
    pub fn write(&self, key: &str, data: &[u8]) -> Result<()> {
        let full = self.full_key(key)?;
        self.backend.write(&full, data)
    }

    /// Remove a value; removing a missing key is not an error.
    #[instrument(skip(self), fields(namespace = %self.namespace))]
    pub fn remove(&self, key: &str) -> Result<()> {
        let full = self.full_key(key)?;
        match self.backend.delete(&full) {
            Err(e) if is_not_found(&e) => Ok(()),
            other => other,
        }
    }

    /// Keys inside this namespace, with the namespace stripped.
    pub fn keys(&self) -> Result<Vec<String>> {
        let prefix = format!("{}{SEPARATOR}", self.namespace);
        Ok(self
            .backend
            .keys(Some(&self.namespace))?
            .into_iter()
            .filter_map(|key| key.strip_prefix(&prefix).map(str::to_string))
            .collect())
    }

    /// Remove every value in this namespace and nothing else.
    #[instrument(skip(self), fields(namespace = %self.namespace))]
    pub fn clear(&self) -> Result<()> {
        for key in self.keys()? {
            self.remove(&key).or_raise(|| ErrorKind::BackendError(format!("failed to clear {key}")))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StorageBackend;
    use crate::backend::MemoryBackend;
    use std::sync::Arc;

    fn gateway(namespace: &str) -> (Arc<MemoryBackend>, Gateway) {
        let backend = Arc::new(MemoryBackend::default());
        let gateway = Gateway::new(backend.clone(), namespace).unwrap();
        (backend, gateway)
    }

    #[test]
    fn test_keys_are_namespaced() {
        let (backend, gateway) = gateway("manga-reader");
        gateway.write("library", b"[]").unwrap();
        assert!(backend.exists("manga-reader:library").unwrap());
        assert!(!backend.exists("library").unwrap());
    }

    #[test]
    fn test_namespaces_do_not_collide() {
        let backend: BackendHandle = Arc::new(MemoryBackend::default());
        let ours = Gateway::new(Arc::clone(&backend), "manga-reader").unwrap();
        let theirs = Gateway::new(Arc::clone(&backend), "another-app").unwrap();
        ours.write("theme", b"dark").unwrap();
        theirs.write("theme", b"light").unwrap();
        assert_eq!(ours.read("theme").unwrap(), Some(b"dark".to_vec()));
        assert_eq!(theirs.read("theme").unwrap(), Some(b"light".to_vec()));
    }

    #[test]
    fn test_remove_missing_is_ok() {
        let (_backend, gateway) = gateway("ns");
        gateway.remove("nothing").unwrap();
        gateway.write("something", b"1").unwrap();
        gateway.remove("something").unwrap();
        assert_eq!(gateway.read("something").unwrap(), None);
    }

    #[test]
    fn test_clear_only_touches_namespace() {
        let backend = Arc::new(MemoryBackend::with_values([
            ("ns:library", b"1".to_vec()),
            ("ns:progress", b"2".to_vec()),
            ("nsx:library", b"3".to_vec()),
        ]));
        let gateway = Gateway::new(backend.clone(), "ns").unwrap();
        assert_eq!(gateway.keys().unwrap(), ["library", "progress"]);
        gateway.clear().unwrap();
        assert!(gateway.keys().unwrap().is_empty());
        assert!(backend.exists("nsx:library").unwrap());
    }

    #[test]
    fn test_invalid_namespace_and_key() {
        let backend = Arc::new(MemoryBackend::default());
        assert!(Gateway::new(backend.clone(), "bad namespace").is_err());
        let gateway = Gateway::new(backend, "ns").unwrap();
        let err = gateway.write("../escape", b"x").unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidKey(_)));
    }

    #[test]
    fn test_backend_failures_propagate() {
        let backend = Arc::new(MemoryBackend::default().with_capacity(2));
        let gateway = Gateway::new(backend, "ns").unwrap();
        let err = gateway.write("big", b"too large").unwrap_err();
        assert!(matches!(&*err, ErrorKind::Full(_)));
    }
}
