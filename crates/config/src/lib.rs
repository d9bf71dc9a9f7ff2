//! Layered configuration.
//!
//! Values come from, in increasing priority: built-in defaults, a TOML file
//! and `KOMA_`-prefixed environment variables (nested keys separated by
//! `__`, e.g. `KOMA_READER__TAP__NEXT=0.8`).
//!
//! ```toml
//! [storage]
//! namespace = "manga-reader"
//! read_only = false
//! backend = { type = "local", root = "/home/me/.local/share/koma" }
//!
//! [reader]
//! controls_timeout_ms = 3000
//! tap = { previous = 0.3, next = 0.7 }
//! swipe = { min_distance = 50.0, max_duration_ms = 600, drag_threshold = 10.0 }
//! ```

pub mod error;
mod models;

pub use crate::models::{BackendConfig, Config, ReaderConfig, StorageConfig, SwipeConfig, TapConfig};

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use std::path::{Path, PathBuf};

/// File name looked up in the working and configuration directories.
pub const CONFIG_FILE_NAME: &str = "koma.toml";
/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "KOMA_";

pub(crate) fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "koma", "koma")
}

/// Files read when no explicit path is given; later ones win.
pub fn default_config_files() -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Some(dirs) = project_dirs() {
        files.push(dirs.config_dir().join(CONFIG_FILE_NAME));
    }
    files.push(PathBuf::from(CONFIG_FILE_NAME));
    files
}

impl Config {
    /// Assemble the layers without extracting them.
    ///
    /// With an explicit `path` only that file is read; otherwise the
    /// [default files](default_config_files) are read if they exist.
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        match path {
            Some(path) => figment = figment.merge(Toml::file(path)),
            None => {
                for file in default_config_files() {
                    figment = figment.merge(Toml::file(file));
                }
            },
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load and validate the configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path
            && !path.is_file()
        {
            exn::bail!(ErrorKind::Invalid(format!("config file not found: {}", path.display())));
        }
        Self::from_figment(&Self::figment(path))
    }

    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Invalid("failed to parse".to_string()))?;
        config.validate()?;
        tracing::debug!(?config, "Loaded configuration");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        Jail::expect_with(|_jail| {
            let config = Config::load(None).unwrap();
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE_NAME,
                r#"
                    [storage]
                    namespace = "from-file"
                    backend = { type = "memory" }

                    [reader]
                    controls_timeout_ms = 5000
                "#,
            )?;
            jail.set_env("KOMA_STORAGE__NAMESPACE", "from-env");
            jail.set_env("KOMA_READER__TAP__NEXT", "0.8");
            let config = Config::load(None).unwrap();
            assert_eq!(config.storage.namespace, "from-env");
            assert_eq!(config.storage.backend, BackendConfig::Memory);
            assert_eq!(config.reader.controls_timeout_ms, 5000);
            assert_eq!(config.reader.tap.next, 0.8);
            assert_eq!(config.reader.tap.previous, 0.3);
            Ok(())
        });
    }

    #[test]
    fn test_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[storage]\nread_only = true\n\n[reader.swipe]\nmin_distance = 80.0").unwrap();
        let config = Config::from_figment(&Config::figment(Some(file.path()))).unwrap();
        assert!(config.storage.read_only);
        assert_eq!(config.reader.swipe.min_distance, 80.0);
        assert_eq!(config.reader.swipe.max_duration_ms, 600);
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)));
    }

    #[test]
    fn test_invalid_values_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("KOMA_READER__TAP__PREVIOUS", "0.9");
            let err = Config::load(None).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Invalid(_)));
            Ok(())
        });
    }

    #[test]
    fn test_unparseable_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE_NAME, "[reader]\ncontrols_timeout_ms = \"soon\"")?;
            let err = Config::load(None).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Invalid(_)));
            Ok(())
        });
    }
}
