//! Error types for revtrack-exec

use thiserror::Error;

/// Errors that prevent a command from producing a result
#[derive(Error, Debug, Clone)]
pub enum ExecError {
    /// Process spawn error
    #[error("failed to spawn process: {0}")]
    SpawnError(String),

    /// I/O error during execution
    #[error("I/O error: {0}")]
    IoError(String),

    /// Command line could not be built
    #[error("invalid command: {0}")]
    InvalidCommand(String),
}
