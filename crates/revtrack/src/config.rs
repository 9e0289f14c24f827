//! Configuration loading and types

use std::path::{Path, PathBuf};

use revtrack_store::TableNames;
use serde::{Deserialize, Serialize};

/// Top-level configuration for the revtrack server
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Daemon server settings
    #[serde(default)]
    pub daemon: DaemonConfig,
    /// Report registry and rule storage
    #[serde(default)]
    pub store: StoreConfig,
}

/// Daemon server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Address and port to bind to
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            log_level: default_log_level(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// `SQLite` database file
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    /// Table holding client reports
    #[serde(default = "default_phonehome_table")]
    pub phonehome_table: String,
    /// Table holding hostname rules
    #[serde(default = "default_version_table")]
    pub version_table: String,
    /// Key stored reports by the first hostname label only
    ///
    /// Rule matching always sees the full hostname.
    #[serde(default = "default_short_hostname_key")]
    pub short_hostname_key: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            phonehome_table: default_phonehome_table(),
            version_table: default_version_table(),
            short_hostname_key: default_short_hostname_key(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("revtrack.db")
}

fn default_phonehome_table() -> String {
    TableNames::default().phonehome
}

fn default_version_table() -> String {
    TableNames::default().version
}

fn default_short_hostname_key() -> bool {
    true
}

impl StoreConfig {
    /// Table names for the store
    #[must_use]
    pub fn tables(&self) -> TableNames {
        TableNames {
            phonehome: self.phonehome_table.clone(),
            version: self.version_table.clone(),
        }
    }
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from default paths or use defaults
    pub fn load_default() -> eyre::Result<Self> {
        if let Ok(path) = std::env::var("REVTRACK_CONFIG") {
            return Self::load(Path::new(&path));
        }

        let mut paths = vec![
            PathBuf::from("revtrack.toml"),
            PathBuf::from("/etc/revtrack/revtrack.toml"),
        ];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("revtrack/revtrack.toml"));
        }

        for path in paths {
            if path.exists() {
                return Self::load(&path);
            }
        }

        tracing::warn!("no config file found, using defaults");
        Ok(Config::default())
    }
}
