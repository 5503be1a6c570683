use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Directory searched for named configs (`-c prod` → `/etc/socialid/prod.toml`).
pub const CONFIG_DIR: &str = "/etc/socialid";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Store configuration, loaded from a TOML file:
///
/// ```toml
/// [storage]
/// data_dir = "/var/lib/socialid"
///
/// [dump]
/// enabled = true
/// interval_secs = 3600
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub storage: StorageConfig,

    #[serde(default)]
    pub dump: DumpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the database file and dumps.
    pub data_dir: PathBuf,

    /// Path to the redb database file.
    /// Defaults to `{data_dir}/identity.redb` if not specified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
}

/// Periodic snapshot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory for snapshot files.
    /// Defaults to `{data_dir}/dumps` if not specified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// Seconds between snapshots (default: 1h).
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_interval_secs() -> u64 {
    3600
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
            interval_secs: default_interval_secs(),
        }
    }
}

impl StoreConfig {
    /// Config with defaults for everything but the data directory.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage: StorageConfig {
                data_dir: data_dir.into(),
                db_path: None,
            },
            dump: DumpConfig::default(),
        }
    }

    /// Resolve a `-c` argument: anything that looks like a path is used as is,
    /// a bare name maps to `/etc/socialid/<name>.toml`.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            Path::new(CONFIG_DIR).join(format!("{}.toml", name_or_path))
        }
    }

    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config: StoreConfig = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("storage.data_dir is empty".into()));
        }
        if self.dump.enabled && self.dump.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "dump.interval_secs must be positive when dumps are enabled".into(),
            ));
        }
        Ok(())
    }

    /// Resolve the redb database path, falling back to `{data_dir}/identity.redb`.
    pub fn resolve_db_path(&self) -> PathBuf {
        self.storage
            .db_path
            .clone()
            .unwrap_or_else(|| self.storage.data_dir.join("identity.redb"))
    }

    /// Resolve the dump directory, falling back to `{data_dir}/dumps`.
    pub fn resolve_dump_dir(&self) -> PathBuf {
        self.dump
            .dir
            .clone()
            .unwrap_or_else(|| self.storage.data_dir.join("dumps"))
    }
}
