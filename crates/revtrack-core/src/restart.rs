//! Restart handlers invoked after an update is applied

use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::CoreError;

/// Replaces the running process after an update
///
/// Implementations return once the restart has been arranged; the process
/// itself may keep running for a short grace period.
#[async_trait]
pub trait RestartHandler: Send + Sync {
    async fn restart(&self) -> Result<(), CoreError>;
}

/// Exits the process after a fixed delay, leaving the restart to a supervisor
#[derive(Debug, Clone)]
pub struct ExitRestartHandler {
    delay: Duration,
}

impl ExitRestartHandler {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for ExitRestartHandler {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

#[async_trait]
impl RestartHandler for ExitRestartHandler {
    async fn restart(&self) -> Result<(), CoreError> {
        let delay = self.delay;
        info!(delay = ?delay, "exiting for restart");
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            std::process::exit(0);
        });
        Ok(())
    }
}

/// Only logs; for processes whose restart is driven externally
#[derive(Debug, Clone, Default)]
pub struct LogRestartHandler;

#[async_trait]
impl RestartHandler for LogRestartHandler {
    async fn restart(&self) -> Result<(), CoreError> {
        warn!("restart requested but handled externally");
        Ok(())
    }
}
