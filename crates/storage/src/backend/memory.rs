//! In-memory storage backend.

use crate::error::{Error, ErrorKind, Result};
use crate::key::{has_prefix, validate as validate_key};
use crate::StorageBackend;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory storage backend.
///
/// Values are stored in a `BTreeMap` behind a [`RwLock`], so all trait
/// methods can operate on `&self` without external synchronisation. Ideal for
/// tests, and for sessions that shouldn't leave anything behind.
///
/// An optional capacity (total bytes of all values) makes the backend behave
/// like a quota-limited browser store: writes that don't fit fail with
/// [`Full`](ErrorKind::Full).
///
/// # Examples
///
/// ```
/// use koma_storage::backend::MemoryBackend;
/// use koma_storage::StorageBackend;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MemoryBackend::with_values([
///     ("manga-reader:theme", br#"{"version":1,"theme":"dark"}"#.to_vec()),
/// ]);
/// assert!(backend.exists("manga-reader:theme")?);
///
/// backend.write("manga-reader:library", b"{}")?;
/// assert!(backend.exists("manga-reader:library")?);
/// # Ok(())
/// # }
/// ```
pub struct MemoryBackend {
    name: String,
    capacity: Option<usize>,
    storage: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    /// Create a memory backend pre-populated with values.
    ///
    /// Panics if any key fails validation. If test setup is wrong, then test
    /// should not pass.
    pub fn with_values(values: impl IntoIterator<Item = (impl Into<String>, impl Into<Vec<u8>>)>) -> Self {
        let mut map = BTreeMap::new();
        for (key, data) in values {
            let key = key.into();
            let Ok(validated) = validate_key(&key) else {
                // The panic here is DELIBERATE. There is no error result.
                panic!("MemoryBackend::with_values: invalid key {key}");
            };
            map.insert(validated, data.into());
        }
        Self {
            name: "memory".to_string(),
            capacity: None,
            storage: RwLock::new(map),
        }
    }

    /// Change the name of the memory backend.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Limit the total size (in bytes) of all stored values.
    pub fn with_capacity(mut self, bytes: usize) -> Self {
        self.capacity = Some(bytes);
        self
    }

    /// Total size of all stored values.
    pub fn used(&self) -> Result<usize> {
        Ok(self.reader()?.values().map(Vec::len).sum())
    }

    fn reader(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, Vec<u8>>>> {
        self.storage.read().map_err(|_| Error::from(ErrorKind::BackendError("lock poisoned".to_string())))
    }

    fn writer(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, Vec<u8>>>> {
        self.storage.write().map_err(|_| Error::from(ErrorKind::BackendError("lock poisoned".to_string())))
    }
}
impl Default for MemoryBackend {
    fn default() -> Self {
        let values: [(&str, Vec<u8>); 0] = [];
        Self::with_values(values)
    }
}

impl StorageBackend for MemoryBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn keys(&self, prefix: Option<&str>) -> Result<Vec<String>> {
        let prefix = prefix.map(validate_key).transpose()?;
        // BTreeMap iteration is already sorted.
        Ok(self
            .reader()?
            .keys()
            .filter(|key| prefix.as_deref().is_none_or(|pfx| has_prefix(key, pfx)))
            .cloned()
            .collect())
    }

    fn exists(&self, key: &str) -> Result<bool> {
        let key = validate_key(key)?;
        Ok(self.reader()?.contains_key(&key))
    }

    fn read(&self, key: &str) -> Result<Vec<u8>> {
        let key = validate_key(key)?;
        self.reader()?.get(&key).cloned().ok_or_else(|| Error::from(ErrorKind::NotFound(key)))
    }

    fn write(&self, key: &str, data: &[u8]) -> Result<()> {
        let key = validate_key(key)?;
        let mut guard = self.writer()?;
        if let Some(capacity) = self.capacity {
            let others: usize = guard.iter().filter(|(k, _)| **k != key).map(|(_, v)| v.len()).sum();
            if others + data.len() > capacity {
                exn::bail!(ErrorKind::Full(key));
            }
        }
        guard.insert(key, data.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let key = validate_key(key)?;
        self.writer()?.remove(&key).map(|_| ()).ok_or_else(|| Error::from(ErrorKind::NotFound(key)))
    }
}
