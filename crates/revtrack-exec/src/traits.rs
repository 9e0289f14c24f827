//! Command runner trait

use async_trait::async_trait;

use crate::command::CommandSpec;
use crate::error::ExecError;
use crate::result::CommandResult;

/// Executes commands and captures their output
///
/// A non-zero exit is reported through `CommandResult::status`, not as an
/// `Err`; errors mean the command could not be run at all.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion
    async fn run(&self, spec: &CommandSpec) -> Result<CommandResult, ExecError>;
}
