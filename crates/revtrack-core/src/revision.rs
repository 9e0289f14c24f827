//! Repository revision lookup

use std::sync::Arc;

use revtrack_exec::{CommandRunner, CommandSpec};
use tracing::{debug, error, instrument};

use crate::error::CoreError;

/// Reads the checked-out revision by running the configured command
pub struct RevisionLookup {
    runner: Arc<dyn CommandRunner>,
    command: CommandSpec,
}

impl RevisionLookup {
    pub fn new(runner: Arc<dyn CommandRunner>, command: CommandSpec) -> Self {
        Self { runner, command }
    }

    /// Run the lookup command and return its trimmed stdout
    ///
    /// # Errors
    /// Returns `CoreError::RevisionLookupFailure` if the command cannot run,
    /// exits non-zero, or prints nothing
    #[instrument(skip(self), fields(command = %self.command))]
    pub async fn lookup(&self) -> Result<String, CoreError> {
        let result = self.runner.run(&self.command).await.map_err(|e| {
            error!(error = %e, "revision lookup could not run");
            CoreError::RevisionLookupFailure(e.to_string())
        })?;

        if !result.success() {
            error!(
                status = result.status,
                stdout = %result.stdout,
                stderr = %result.stderr,
                "revision lookup failed"
            );
            return Err(CoreError::RevisionLookupFailure(format!(
                "exit status {}: {}",
                result.status,
                result.combined_output().trim()
            )));
        }

        let revision = result.stdout.trim();
        if revision.is_empty() {
            return Err(CoreError::RevisionLookupFailure(
                "command printed no revision".to_string(),
            ));
        }

        debug!(revision = %revision, "resolved revision");
        Ok(revision.to_string())
    }
}
