//! Application state shared across HTTP handlers

use std::sync::Arc;

use revtrack_store::RevisionStore;

use crate::config::Config;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Report registry and rule storage
    pub store: Arc<dyn RevisionStore>,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(store: Arc<dyn RevisionStore>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Hostname under which a report is stored
    #[must_use]
    pub fn record_hostname<'a>(&self, hostname: &'a str) -> &'a str {
        if self.config.store.short_hostname_key {
            hostname.split('.').next().unwrap_or(hostname)
        } else {
            hostname
        }
    }
}
