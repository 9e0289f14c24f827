//! Store trait used by the phonehome endpoint

use async_trait::async_trait;
use revtrack_core::RevisionRule;

use crate::error::StoreError;
use crate::record::PhonehomeRecord;

/// Storage backing the phonehome endpoint
#[async_trait]
pub trait RevisionStore: Send + Sync {
    /// Insert the record, or update revision, addresses and
    /// `last_updated_at` of the existing `(package_name, hostname)` row
    async fn upsert_report(&self, record: &PhonehomeRecord) -> Result<(), StoreError>;

    /// All rules configured for `package_name`
    async fn rules_for_package(&self, package_name: &str)
    -> Result<Vec<RevisionRule>, StoreError>;
}
