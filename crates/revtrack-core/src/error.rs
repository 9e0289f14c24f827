//! Core error types for revtrack-core

use thiserror::Error;

/// Errors surfaced by the client-side revision protocol
///
/// Every variant is delivered to the caller of the failing operation; none
/// terminates the process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The boot/current revision could not be read from the repository
    #[error("revision lookup failed: {0}")]
    RevisionLookupFailure(String),

    /// The external update command failed or could not be started
    #[error("update command failed with status {status}: {output}")]
    UpdateCommandFailure {
        /// Exit status (-1 if the command never ran)
        status: i32,
        /// Captured stdout/stderr
        output: String,
    },

    /// The phonehome request did not complete
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// The authority answered with a non-2xx status
    #[error("bad HTTP status: {0}")]
    BadHttpStatus(u16),

    /// The authority answered with an empty or unparseable body
    #[error("malformed response body: {0}")]
    MalformedResponseBody(String),

    /// A manual update was requested while no update is available
    #[error("no update available")]
    NoUpdateAvailable,

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(String),
}
