//! Local command execution using `tokio::process`

use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error, instrument};

use crate::command::CommandSpec;
use crate::error::ExecError;
use crate::result::CommandResult;
use crate::traits::CommandRunner;

/// Local command runner
///
/// Executes commands on the local machine using `tokio::process::Command`.
#[derive(Debug, Clone)]
pub struct LocalRunner;

impl LocalRunner {
    /// Create a new local runner
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Internal method to execute command
    #[instrument(skip(self, spec), fields(command = %spec), level = "debug")]
    async fn execute(&self, spec: &CommandSpec) -> Result<CommandResult, ExecError> {
        let start = Instant::now();

        debug!(cwd = ?spec.cwd, "executing local command");

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &spec.cwd {
            command.current_dir(cwd);
        }

        let child = command
            .spawn()
            .map_err(|e| ExecError::SpawnError(format!("{}: {e}", spec.program)))?;

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ExecError::IoError(e.to_string()))?;

        let duration = start.elapsed();

        let status = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        debug!(status = status, duration = ?duration, "command completed");

        if !output.status.success() {
            error!(status = status, stderr = %stderr, "command failed");
        }

        Ok(CommandResult {
            status,
            stdout,
            stderr,
            duration,
        })
    }
}

impl Default for LocalRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for LocalRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandResult, ExecError> {
        self.execute(spec).await
    }
}
