//! Local filesystem storage backend.
//!
//! Each key becomes a file under a configured root directory: every segment
//! but the last is a directory, the last one gets a `.kv` suffix
//! (`manga-reader:library` → `<root>/manga-reader/library.kv`). The suffix
//! keeps `a` (a value) and `a:b` (a value under `a`) from colliding.

use crate::error::{Error, ErrorKind, Result};
use crate::key::{SEPARATOR, has_prefix, validate as validate_key};
use crate::StorageBackend;
use std::fs;
use std::path::{Path, PathBuf};

const VALUE_SUFFIX: &str = ".kv";
const TEMP_SUFFIX: &str = ".kv.tmp";

/// Local filesystem storage backend.
///
/// # Examples
///
/// ```no_run
/// use koma_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("local", "/home/me/.local/share/koma")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalBackend {
    name: String,
    /// Root directory holding every value
    root: PathBuf,
}
impl LocalBackend {
    /// Create a new local filesystem backend, creating the root directory if
    /// it doesn't exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not absolute, or exists but isn't a
    /// directory.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::BackendError(format!("root `{}` is not absolute", root.display())));
        }
        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::BackendError(format!("root `{}` is not a directory", root.display())));
            }
        } else {
            fs::create_dir_all(&root).map_err(|e| Self::map_io_error(e, &root.display().to_string()))?;
        }
        Ok(Self { name: name.into(), root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the file path for a key.
    fn file_path(&self, key: &str) -> Result<PathBuf> {
        let key = validate_key(key)?;
        let mut path = self.root.clone();
        let mut segments = key.split(SEPARATOR).peekable();
        while let Some(segment) = segments.next() {
            if segments.peek().is_some() {
                path.push(segment);
            } else {
                path.push(format!("{segment}{VALUE_SUFFIX}"));
            }
        }
        Ok(path)
    }

    /// Convert a value file back into its key. Returns `None` for anything
    /// that isn't a value file (temporary files, strays).
    fn key_for(&self, file: &Path) -> Option<String> {
        let relative = file.strip_prefix(&self.root).ok()?;
        let mut segments: Vec<String> =
            relative.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect();
        let last = segments.pop()?;
        segments.push(last.strip_suffix(VALUE_SUFFIX)?.to_string());
        let key = segments.join(&SEPARATOR.to_string());
        validate_key(&key).ok()
    }

    fn map_io_error(e: std::io::Error, key: &str) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(key.to_string()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(key.to_string()),
            std::io::ErrorKind::StorageFull | std::io::ErrorKind::QuotaExceeded => ErrorKind::Full(key.to_string()),
            _ => ErrorKind::Io(e),
        }
    }
}

impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn keys(&self, prefix: Option<&str>) -> Result<Vec<String>> {
        let prefix = prefix.map(validate_key).transpose()?;
        let mut keys = Vec::new();
        let mut stack = vec![self.root.clone()];
        while let Some(current) = stack.pop() {
            let entries = match fs::read_dir(&current) {
                Ok(entries) => entries,
                // A directory removed underneath us just has no keys.
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                Err(err) => return Err(Error::from(ErrorKind::Io(err))),
            };
            for entry in entries {
                let entry = entry.map_err(ErrorKind::Io)?;
                let file_type = entry.file_type().map_err(ErrorKind::Io)?;
                let path = entry.path();
                if file_type.is_dir() {
                    stack.push(path);
                } else if file_type.is_file()
                    && let Some(key) = self.key_for(&path)
                    && prefix.as_deref().is_none_or(|pfx| has_prefix(&key, pfx))
                {
                    keys.push(key);
                }
                // Note: silently drop what is most likely a broken symlink.
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn exists(&self, key: &str) -> Result<bool> {
        let path = self.file_path(key)?;
        Ok(path.try_exists().map_err(|e| Self::map_io_error(e, key))? && path.is_file())
    }

    fn read(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.file_path(key)?;
        Ok(fs::read(&path).map_err(|e| Self::map_io_error(e, key))?)
    }

    fn write(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.file_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Self::map_io_error(e, key))?;
        }
        // Write next to the target and rename over it, so a crash mid-write
        // never leaves a half-written value behind.
        let temp = path.with_extension(TEMP_SUFFIX.trim_start_matches('.'));
        fs::write(&temp, data).map_err(|e| Self::map_io_error(e, key))?;
        if let Err(e) = fs::rename(&temp, &path) {
            let _ = fs::remove_file(&temp);
            exn::bail!(Self::map_io_error(e, key));
        }
        tracing::trace!(backend = %self.name, key, bytes = data.len(), "Wrote value");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.file_path(key)?;
        Ok(fs::remove_file(&path).map_err(|e| Self::map_io_error(e, key))?)
    }
}
