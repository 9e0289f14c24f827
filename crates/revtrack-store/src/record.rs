//! Persisted client report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last known state of one client, keyed by `(package_name, hostname)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhonehomeRecord {
    pub package_name: String,
    pub hostname: String,
    /// Revision the client reported as applied
    pub git_hash: String,
    /// Comma-joined address list
    pub ip_list: String,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

impl PhonehomeRecord {
    /// Record a report received now
    pub fn new(
        package_name: impl Into<String>,
        hostname: impl Into<String>,
        git_hash: impl Into<String>,
        ip_list: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            package_name: package_name.into(),
            hostname: hostname.into(),
            git_hash: git_hash.into(),
            ip_list: ip_list.into(),
            created_at: now,
            last_updated_at: now,
        }
    }
}
