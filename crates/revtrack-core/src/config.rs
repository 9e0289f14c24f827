//! Configuration for a reporting client

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Settings for one client instance
///
/// Constructed once at startup and handed to the `ClientActor`; several
/// instances may coexist in one process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Package name reported to the authority
    #[serde(default)]
    pub package_name: String,
    /// Repository checkout the revision commands run in
    #[serde(default = "default_repo_dir")]
    pub repo_dir: PathBuf,
    /// Phonehome endpoint URL
    #[serde(default)]
    pub url: String,
    /// Milliseconds between scheduled reports (0 disables rescheduling)
    #[serde(default)]
    pub interval_ms: u64,
    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Apply an available update without waiting for a manual trigger
    #[serde(default)]
    pub auto_update: bool,
    /// Invoke the restart handler after every applied update
    #[serde(default)]
    pub auto_restart: bool,
    /// Update script, called as `<script> <target> <reference>`
    ///
    /// Relative paths are resolved against `repo_dir`. When unset, the
    /// bundled `git_update_to_hash.sh` is run through `sh`.
    #[serde(default)]
    pub update_command: Option<PathBuf>,
    /// Command printing the checked-out revision on stdout
    #[serde(default = "default_revision_command")]
    pub revision_command: Vec<String>,
    /// Grace period before the default restart handler exits
    #[serde(default = "default_restart_delay_ms")]
    pub restart_delay_ms: u64,
    /// Extra headers sent with every phonehome request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_repo_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_revision_command() -> Vec<String> {
    ["git", "log", "-n", "1", "--pretty=format:%H"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_restart_delay_ms() -> u64 {
    100
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            package_name: String::new(),
            repo_dir: default_repo_dir(),
            url: String::new(),
            interval_ms: 0,
            timeout_ms: default_timeout_ms(),
            auto_update: false,
            auto_restart: false,
            update_command: None,
            revision_command: default_revision_command(),
            restart_delay_ms: default_restart_delay_ms(),
            headers: BTreeMap::new(),
        }
    }
}

impl ClientConfig {
    /// Create a config with defaults for the given package and endpoint
    pub fn new(package_name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    /// Delay between scheduled reports, `None` when rescheduling is disabled
    #[must_use]
    pub fn interval(&self) -> Option<Duration> {
        (self.interval_ms > 0).then(|| Duration::from_millis(self.interval_ms))
    }

    /// Network request timeout
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Grace period for the default restart handler
    #[must_use]
    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }

    /// Configured update script, resolved against the repository directory
    ///
    /// `None` selects the bundled script.
    #[must_use]
    pub fn update_script(&self) -> Option<PathBuf> {
        self.update_command.as_ref().map(|command| {
            if command.is_absolute() {
                command.clone()
            } else {
                self.repo_dir.join(command)
            }
        })
    }

    /// Check required settings
    ///
    /// # Errors
    /// Returns `CoreError::ConfigError` if a required field is empty
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.package_name.is_empty() {
            return Err(CoreError::ConfigError("package_name is required".into()));
        }
        if self.url.is_empty() {
            return Err(CoreError::ConfigError("url is required".into()));
        }
        if self.revision_command.is_empty() {
            return Err(CoreError::ConfigError(
                "revision_command must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_toml() {
        let config: ClientConfig = toml::from_str(
            r#"
            package_name = "web"
            url = "http://authority/phonehome"
            "#,
        )
        .unwrap();

        assert_eq!(config.timeout(), Duration::from_secs(20));
        assert_eq!(config.interval(), None);
        assert!(!config.auto_update);
        assert_eq!(config.revision_command[0], "git");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_update_script_resolution() {
        let mut config = ClientConfig::new("web", "http://authority");
        config.repo_dir = PathBuf::from("/srv/web");
        assert_eq!(config.update_script(), None);

        config.update_command = Some(PathBuf::from("bin/deploy.sh"));
        assert_eq!(
            config.update_script(),
            Some(PathBuf::from("/srv/web/bin/deploy.sh"))
        );

        config.update_command = Some(PathBuf::from("/usr/local/bin/deploy"));
        assert_eq!(
            config.update_script(),
            Some(PathBuf::from("/usr/local/bin/deploy"))
        );
    }

    #[test]
    fn test_validate_requires_package_and_url() {
        assert!(ClientConfig::new("", "http://x").validate().is_err());
        assert!(ClientConfig::new("web", "").validate().is_err());
    }

    #[test]
    fn test_interval_enabled() {
        let mut config = ClientConfig::new("web", "http://authority");
        config.interval_ms = 30_000;
        assert_eq!(config.interval(), Some(Duration::from_secs(30)));
    }
}
