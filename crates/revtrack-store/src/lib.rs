//! revtrack-store: Report registry and rule storage
//!
//! Persists the last known state of every reporting client and serves the
//! revision rules the authority resolves against.

pub mod error;
pub mod record;
pub mod sqlite;
pub mod traits;

pub use error::StoreError;
pub use record::PhonehomeRecord;
pub use sqlite::{SqliteStore, TableNames};
pub use traits::RevisionStore;
