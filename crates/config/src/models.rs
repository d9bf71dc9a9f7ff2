use crate::error::{ErrorKind, Result};
use crate::project_dirs;
use exn::ResultExt;
use koma_reader::{ReaderSettings, SwipeThresholds, TapZones};
use koma_storage::backend::{LocalBackend, MemoryBackend, ReadOnlyBackend};
use koma_storage::{BackendHandle, DEFAULT_NAMESPACE, Gateway};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub reader: ReaderConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Prefix of every persisted key.
    pub namespace: String,
    /// Refuse every write; the library then runs in memory only.
    pub read_only: bool,
    pub backend: BackendConfig,
}
impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            read_only: false,
            backend: BackendConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    /// One file per key under `root` (the platform data directory when not
    /// set).
    Local {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        root: Option<PathBuf>,
    },
    /// Nothing survives the process.
    Memory,
}
impl Default for BackendConfig {
    fn default() -> Self {
        Self::Local { root: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub controls_timeout_ms: u64,
    pub tap: TapConfig,
    pub swipe: SwipeConfig,
}
impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            controls_timeout_ms: 3000,
            tap: TapConfig::default(),
            swipe: SwipeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TapConfig {
    pub previous: f64,
    pub next: f64,
}
impl Default for TapConfig {
    fn default() -> Self {
        let zones = TapZones::default();
        Self { previous: zones.previous, next: zones.next }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwipeConfig {
    pub min_distance: f64,
    pub max_duration_ms: u64,
    pub drag_threshold: f64,
}
impl Default for SwipeConfig {
    fn default() -> Self {
        let thresholds = SwipeThresholds::default();
        Self {
            min_distance: thresholds.min_distance,
            max_duration_ms: u64::try_from(thresholds.max_duration.as_millis()).unwrap_or(u64::MAX),
            drag_threshold: thresholds.drag_threshold,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        koma_storage::validate_key(&self.storage.namespace)
            .or_raise(|| ErrorKind::Invalid(format!("storage.namespace: {:?}", self.storage.namespace)))?;
        if let BackendConfig::Local { root: Some(root) } = &self.storage.backend
            && !root.is_absolute()
        {
            exn::bail!(ErrorKind::Invalid(format!("storage.backend.root must be absolute: {}", root.display())));
        }
        self.reader.validate()
    }

    /// Build the storage gateway described by the `storage` section.
    pub fn open_gateway(&self) -> Result<Gateway> {
        let backend: BackendHandle = match &self.storage.backend {
            BackendConfig::Memory => Arc::new(MemoryBackend::default()),
            BackendConfig::Local { root } => {
                let root = match root {
                    Some(root) => root.clone(),
                    None => default_data_dir()?,
                };
                tracing::debug!(root = %root.display(), "Opening local storage");
                Arc::new(LocalBackend::new("local", root).or_raise(|| ErrorKind::Storage("local"))?)
            },
        };
        let backend: BackendHandle = if self.storage.read_only {
            Arc::new(ReadOnlyBackend::new(backend))
        } else {
            backend
        };
        Gateway::new(backend, &self.storage.namespace).or_raise(|| ErrorKind::Invalid("storage.namespace".to_string()))
    }

    pub fn reader_settings(&self) -> ReaderSettings {
        self.reader.settings()
    }
}

fn default_data_dir() -> Result<PathBuf> {
    if let Some(dirs) = project_dirs() {
        return Ok(dirs.data_dir().to_path_buf());
    }
    let cwd = std::env::current_dir().or_raise(|| ErrorKind::Storage("local"))?;
    Ok(cwd.join(".koma"))
}

impl ReaderConfig {
    fn validate(&self) -> Result<()> {
        let TapConfig { previous, next } = self.tap;
        if !(0.0 < previous && previous <= next && next < 1.0) {
            exn::bail!(ErrorKind::Invalid(format!(
                "reader.tap: expected 0 < previous <= next < 1, got previous={previous} next={next}"
            )));
        }
        if self.controls_timeout_ms == 0 {
            exn::bail!(ErrorKind::Invalid("reader.controls_timeout_ms must be positive".to_string()));
        }
        if !(self.swipe.min_distance > 0.0) || !(self.swipe.drag_threshold > 0.0) {
            exn::bail!(ErrorKind::Invalid("reader.swipe distances must be positive".to_string()));
        }
        if self.swipe.max_duration_ms == 0 {
            exn::bail!(ErrorKind::Invalid("reader.swipe.max_duration_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn settings(&self) -> ReaderSettings {
        ReaderSettings {
            controls_timeout: Duration::from_millis(self.controls_timeout_ms),
            tap: TapZones {
                previous: self.tap.previous,
                next: self.tap.next,
            },
            swipe: SwipeThresholds {
                min_distance: self.swipe.min_distance,
                max_duration: Duration::from_millis(self.swipe.max_duration_ms),
                drag_threshold: self.swipe.drag_threshold,
            },
        }
    }
}
