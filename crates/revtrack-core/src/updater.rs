//! Update executor

use std::path::PathBuf;
use std::sync::Arc;

use revtrack_exec::{CommandResult, CommandRunner, CommandSpec};
use tracing::{error, info, instrument};

use crate::error::CoreError;

/// Default update script shipped with the client
pub const BUNDLED_UPDATE_SCRIPT: &str = include_str!("../scripts/git_update_to_hash.sh");

/// Applies a revision by running the external update script
///
/// The script is called as `<script> <target> <reference>` inside the
/// repository directory, where `reference` is the boot revision. Without a
/// configured script the bundled one runs as `sh -c <script> <name> <target>
/// <reference>`.
pub struct UpdateExecutor {
    runner: Arc<dyn CommandRunner>,
    script: Option<PathBuf>,
    repo_dir: PathBuf,
}

impl UpdateExecutor {
    pub fn new(runner: Arc<dyn CommandRunner>, script: Option<PathBuf>, repo_dir: PathBuf) -> Self {
        Self {
            runner,
            script,
            repo_dir,
        }
    }

    fn command(&self, target: &str, reference: &str) -> CommandSpec {
        let command = match &self.script {
            Some(script) => CommandSpec::new(script.to_string_lossy()),
            None => CommandSpec::new("sh")
                .arg("-c")
                .arg(BUNDLED_UPDATE_SCRIPT)
                .arg("git_update_to_hash.sh"),
        };
        command
            .arg(target)
            .arg(reference)
            .current_dir(&self.repo_dir)
    }

    /// Run the update script once
    ///
    /// # Errors
    /// Returns `CoreError::UpdateCommandFailure` with the captured output if
    /// the script cannot be started or exits non-zero
    #[instrument(skip(self))]
    pub async fn apply(
        &self,
        target_revision: &str,
        reference_revision: &str,
    ) -> Result<CommandResult, CoreError> {
        let command = self.command(target_revision, reference_revision);

        let result = self.runner.run(&command).await.map_err(|e| {
            error!(command = %command, error = %e, "update script could not run");
            CoreError::UpdateCommandFailure {
                status: -1,
                output: e.to_string(),
            }
        })?;

        if !result.success() {
            error!(
                command = %command,
                status = result.status,
                stdout = %result.stdout,
                stderr = %result.stderr,
                "update script failed"
            );
            return Err(CoreError::UpdateCommandFailure {
                status: result.status,
                output: result.combined_output(),
            });
        }

        info!(duration = ?result.duration, "update script succeeded");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use revtrack_exec::{ExecError, LocalRunner};

    use super::*;

    #[derive(Default)]
    struct RecordingRunner {
        calls: Mutex<Vec<CommandSpec>>,
    }

    #[async_trait]
    impl CommandRunner for RecordingRunner {
        async fn run(&self, spec: &CommandSpec) -> Result<CommandResult, ExecError> {
            self.calls.lock().unwrap().push(spec.clone());
            Ok(CommandResult {
                status: 0,
                stdout: String::new(),
                stderr: String::new(),
                duration: Duration::from_millis(1),
            })
        }
    }

    #[tokio::test]
    async fn test_bundled_script_runs_through_sh() {
        let runner = Arc::new(RecordingRunner::default());
        let executor = UpdateExecutor::new(runner.clone(), None, PathBuf::from("/srv/web"));

        executor.apply("bbb", "aaa").await.unwrap();

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls[0].program, "sh");
        assert_eq!(
            calls[0].args,
            vec![
                "-c".to_string(),
                BUNDLED_UPDATE_SCRIPT.to_string(),
                "git_update_to_hash.sh".to_string(),
                "bbb".to_string(),
                "aaa".to_string(),
            ]
        );
        assert_eq!(calls[0].cwd, Some(PathBuf::from("/srv/web")));
    }

    #[tokio::test]
    async fn test_configured_script_gets_positional_revisions() {
        let runner = Arc::new(RecordingRunner::default());
        let executor = UpdateExecutor::new(
            runner.clone(),
            Some(PathBuf::from("/usr/local/bin/deploy")),
            PathBuf::from("/srv/web"),
        );

        executor.apply("bbb", "aaa").await.unwrap();

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls[0].program, "/usr/local/bin/deploy");
        assert_eq!(calls[0].args, vec!["bbb".to_string(), "aaa".to_string()]);
    }

    #[tokio::test]
    async fn test_bundled_script_rejects_missing_arguments() {
        let spec = CommandSpec::new("sh")
            .arg("-c")
            .arg(BUNDLED_UPDATE_SCRIPT)
            .arg("git_update_to_hash.sh")
            .arg("only-target");

        let result = LocalRunner::new().run(&spec).await.unwrap();

        assert_eq!(result.status, 2);
        assert!(result.stderr.contains("usage"));
    }
}
