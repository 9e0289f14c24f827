//! Error types for revtrack-store

use thiserror::Error;

/// Storage failures
#[derive(Error, Debug)]
pub enum StoreError {
    /// `SQLite` returned an error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configured table name is not a plain identifier
    #[error("invalid table name: {0}")]
    InvalidTableName(String),

    /// A previous holder of the connection panicked
    #[error("database connection lock poisoned")]
    LockPoisoned,

    /// The blocking database task did not complete
    #[error("database task failed: {0}")]
    Task(String),
}
