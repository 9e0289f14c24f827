//! Agent configuration

use std::path::{Path, PathBuf};

use revtrack_core::ClientConfig;
use serde::{Deserialize, Serialize};

/// Agent configuration file
///
/// Client settings sit at the top level next to the agent's own options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Leave restarts to an external supervisor instead of exiting
    #[serde(default)]
    pub external_restart: bool,
    #[serde(flatten)]
    pub client: ClientConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AgentConfig {
    /// Load configuration from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AgentConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from `path`, `REVTRACK_AGENT_CONFIG`, or `./revtrack-agent.toml`
    ///
    /// # Errors
    /// Returns error if no file is found or it cannot be parsed
    pub fn load_from(path: Option<&Path>) -> eyre::Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => std::env::var("REVTRACK_AGENT_CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("revtrack-agent.toml")),
        };
        if !path.exists() {
            eyre::bail!("config file {} not found", path.display());
        }
        Self::load(&path)
    }
}
