//! `SQLite`-backed store
//!
//! # Schema
//!
//! The phonehome table has columns `package_name`, `hostname`, `git_hash`,
//! `ip_list`, `created_at`, `last_updated_at` with primary key
//! `(package_name, hostname)`.
//!
//! The version-rule table has columns `package_name`, `hostname_regex`,
//! `git_hash`, `match_priority` with primary key
//! `(package_name, hostname_regex)`.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use revtrack_core::RevisionRule;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::record::PhonehomeRecord;
use crate::traits::RevisionStore;

/// Names of the two tables, validated as plain SQL identifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableNames {
    /// Client report table
    #[serde(default = "default_phonehome_table")]
    pub phonehome: String,
    /// Revision rule table
    #[serde(default = "default_version_table")]
    pub version: String,
}

fn default_phonehome_table() -> String {
    "revtrack_phonehome".to_string()
}

fn default_version_table() -> String {
    "revtrack_version".to_string()
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            phonehome: default_phonehome_table(),
            version: default_version_table(),
        }
    }
}

impl TableNames {
    /// Check both names
    ///
    /// # Errors
    /// Returns `StoreError::InvalidTableName` unless the name is non-empty,
    /// starts with a letter or underscore and contains only ASCII
    /// alphanumerics and underscores
    pub fn validate(&self) -> Result<(), StoreError> {
        for name in [&self.phonehome, &self.version] {
            let mut chars = name.chars();
            let valid_start = chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
            if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(StoreError::InvalidTableName(name.clone()));
            }
        }
        Ok(())
    }
}

/// Durable report registry and rule table backed by `SQLite`
#[derive(Debug, Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    tables: TableNames,
}

impl SqliteStore {
    /// Open (or create) the database file and ensure the schema exists
    ///
    /// # Errors
    /// Returns `StoreError` if the table names are invalid or the database
    /// cannot be opened or initialized
    pub fn open(path: &Path, tables: TableNames) -> Result<Self, StoreError> {
        tables.validate()?;
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "opened revision store");
        Self::with_connection(conn, tables)
    }

    /// In-memory database, for tests and ephemeral servers
    ///
    /// # Errors
    /// Returns `StoreError` if the table names are invalid
    pub fn open_in_memory(tables: TableNames) -> Result<Self, StoreError> {
        tables.validate()?;
        Self::with_connection(Connection::open_in_memory()?, tables)
    }

    fn with_connection(conn: Connection, tables: TableNames) -> Result<Self, StoreError> {
        Self::init_schema(&conn, &tables)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            tables,
        })
    }

    fn init_schema(conn: &Connection, tables: &TableNames) -> Result<(), StoreError> {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {phonehome} (
                package_name TEXT NOT NULL,
                hostname TEXT NOT NULL,
                git_hash TEXT NOT NULL,
                ip_list TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                last_updated_at TEXT NOT NULL,
                PRIMARY KEY (package_name, hostname)
             );
             CREATE TABLE IF NOT EXISTS {version} (
                package_name TEXT NOT NULL,
                hostname_regex TEXT NOT NULL,
                git_hash TEXT NOT NULL,
                match_priority INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (package_name, hostname_regex)
             );",
            phonehome = tables.phonehome,
            version = tables.version,
        ))?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Insert or update a client record
    ///
    /// # Errors
    /// Returns `StoreError` on database failure
    pub fn upsert_report_blocking(&self, record: &PhonehomeRecord) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            &format!(
                "INSERT INTO {} (package_name, hostname, git_hash, ip_list, created_at, last_updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(package_name, hostname) DO UPDATE SET
                    git_hash = excluded.git_hash,
                    ip_list = excluded.ip_list,
                    last_updated_at = excluded.last_updated_at",
                self.tables.phonehome
            ),
            params![
                record.package_name,
                record.hostname,
                record.git_hash,
                record.ip_list,
                record.created_at,
                record.last_updated_at,
            ],
        )?;
        debug!(
            package = %record.package_name,
            hostname = %record.hostname,
            revision = %record.git_hash,
            "recorded phonehome"
        );
        Ok(())
    }

    /// Rules for a package, in scan order
    ///
    /// # Errors
    /// Returns `StoreError` on database failure
    pub fn rules_for_package_blocking(
        &self,
        package_name: &str,
    ) -> Result<Vec<RevisionRule>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT package_name, hostname_regex, git_hash, match_priority
             FROM {}
             WHERE package_name = ?1
             ORDER BY match_priority DESC, hostname_regex ASC",
            self.tables.version
        ))?;
        let rules = stmt
            .query_map(params![package_name], row_to_rule)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rules)
    }

    /// Add a rule, replacing the target and priority of an existing rule
    /// with the same package and pattern
    ///
    /// # Errors
    /// Returns `StoreError` on database failure
    pub fn put_rule(&self, rule: &RevisionRule) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            &format!(
                "INSERT INTO {} (package_name, hostname_regex, git_hash, match_priority)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(package_name, hostname_regex) DO UPDATE SET
                    git_hash = excluded.git_hash,
                    match_priority = excluded.match_priority",
                self.tables.version
            ),
            params![
                rule.package_name,
                rule.hostname_pattern,
                rule.target_revision,
                rule.match_priority,
            ],
        )?;
        Ok(())
    }

    /// Remove a rule; returns whether it existed
    ///
    /// # Errors
    /// Returns `StoreError` on database failure
    pub fn delete_rule(&self, package_name: &str, hostname_pattern: &str) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            &format!(
                "DELETE FROM {} WHERE package_name = ?1 AND hostname_regex = ?2",
                self.tables.version
            ),
            params![package_name, hostname_pattern],
        )?;
        Ok(deleted > 0)
    }

    /// Every rule, grouped by package
    ///
    /// # Errors
    /// Returns `StoreError` on database failure
    pub fn list_rules(&self) -> Result<Vec<RevisionRule>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT package_name, hostname_regex, git_hash, match_priority
             FROM {}
             ORDER BY package_name ASC, match_priority DESC, hostname_regex ASC",
            self.tables.version
        ))?;
        let rules = stmt
            .query_map([], row_to_rule)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rules)
    }

    /// Look up one client record
    ///
    /// # Errors
    /// Returns `StoreError` on database failure
    pub fn get_record(
        &self,
        package_name: &str,
        hostname: &str,
    ) -> Result<Option<PhonehomeRecord>, StoreError> {
        let conn = self.lock()?;
        let record = conn
            .query_row(
                &format!(
                    "SELECT package_name, hostname, git_hash, ip_list, created_at, last_updated_at
                     FROM {} WHERE package_name = ?1 AND hostname = ?2",
                    self.tables.phonehome
                ),
                params![package_name, hostname],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    /// Client records, optionally restricted to one package
    ///
    /// # Errors
    /// Returns `StoreError` on database failure
    pub fn list_records(
        &self,
        package_name: Option<&str>,
    ) -> Result<Vec<PhonehomeRecord>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT package_name, hostname, git_hash, ip_list, created_at, last_updated_at
             FROM {}
             WHERE ?1 IS NULL OR package_name = ?1
             ORDER BY package_name ASC, hostname ASC",
            self.tables.phonehome
        ))?;
        let records = stmt
            .query_map(params![package_name], row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

fn row_to_rule(row: &rusqlite::Row<'_>) -> rusqlite::Result<RevisionRule> {
    Ok(RevisionRule {
        package_name: row.get(0)?,
        hostname_pattern: row.get(1)?,
        target_revision: row.get(2)?,
        match_priority: row.get(3)?,
    })
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<PhonehomeRecord> {
    Ok(PhonehomeRecord {
        package_name: row.get(0)?,
        hostname: row.get(1)?,
        git_hash: row.get(2)?,
        ip_list: row.get(3)?,
        created_at: row.get(4)?,
        last_updated_at: row.get(5)?,
    })
}

#[async_trait]
impl RevisionStore for SqliteStore {
    async fn upsert_report(&self, record: &PhonehomeRecord) -> Result<(), StoreError> {
        let store = self.clone();
        let record = record.clone();
        tokio::task::spawn_blocking(move || store.upsert_report_blocking(&record))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }

    async fn rules_for_package(
        &self,
        package_name: &str,
    ) -> Result<Vec<RevisionRule>, StoreError> {
        let store = self.clone();
        let package_name = package_name.to_string();
        tokio::task::spawn_blocking(move || store.rules_for_package_blocking(&package_name))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory(TableNames::default()).unwrap()
    }

    #[test]
    fn test_invalid_table_names() {
        let tables = TableNames {
            phonehome: "phonehome; DROP TABLE x".to_string(),
            version: "version".to_string(),
        };
        assert!(matches!(
            SqliteStore::open_in_memory(tables),
            Err(StoreError::InvalidTableName(_))
        ));

        let tables = TableNames {
            phonehome: "phonehome".to_string(),
            version: "1version".to_string(),
        };
        assert!(tables.validate().is_err());
        assert!(TableNames::default().validate().is_ok());
    }

    #[test]
    fn test_custom_table_names() {
        let tables = TableNames {
            phonehome: "ngvt_phonehome".to_string(),
            version: "ngvt_version".to_string(),
        };
        let store = SqliteStore::open_in_memory(tables).unwrap();
        store
            .put_rule(&RevisionRule::new("web", "^web", "aaa", 1))
            .unwrap();

        assert_eq!(store.rules_for_package_blocking("web").unwrap().len(), 1);
    }

    #[test]
    fn test_upsert_updates_on_conflict() {
        let store = store();

        let mut first = PhonehomeRecord::new("web", "web1", "aaa", "10.0.0.1");
        first.created_at = Utc::now() - Duration::hours(1);
        first.last_updated_at = first.created_at;
        store.upsert_report_blocking(&first).unwrap();

        let second = PhonehomeRecord::new("web", "web1", "bbb", "10.0.0.1,10.0.0.2");
        store.upsert_report_blocking(&second).unwrap();

        let record = store.get_record("web", "web1").unwrap().unwrap();
        assert_eq!(record.git_hash, "bbb");
        assert_eq!(record.ip_list, "10.0.0.1,10.0.0.2");
        assert_eq!(record.created_at, first.created_at);
        assert_eq!(record.last_updated_at, second.last_updated_at);

        assert_eq!(store.list_records(None).unwrap().len(), 1);
    }

    #[test]
    fn test_records_keyed_by_package_and_host() {
        let store = store();
        store
            .upsert_report_blocking(&PhonehomeRecord::new("web", "host1", "aaa", ""))
            .unwrap();
        store
            .upsert_report_blocking(&PhonehomeRecord::new("api", "host1", "bbb", ""))
            .unwrap();

        assert_eq!(store.list_records(None).unwrap().len(), 2);
        assert_eq!(store.list_records(Some("api")).unwrap()[0].git_hash, "bbb");
        assert!(store.get_record("web", "host2").unwrap().is_none());
    }

    #[test]
    fn test_rules_ordered_and_scoped() {
        let store = store();
        store
            .put_rule(&RevisionRule::new("web", "^web", "w", 1))
            .unwrap();
        store
            .put_rule(&RevisionRule::new("web", "^db", "d", 2))
            .unwrap();
        store
            .put_rule(&RevisionRule::new("web", "^ab", "ab", 1))
            .unwrap();
        store
            .put_rule(&RevisionRule::new("api", ".", "x", 9))
            .unwrap();

        let rules = store.rules_for_package_blocking("web").unwrap();
        let patterns: Vec<&str> = rules.iter().map(|r| r.hostname_pattern.as_str()).collect();
        assert_eq!(patterns, vec!["^db", "^ab", "^web"]);

        assert_eq!(store.list_rules().unwrap().len(), 4);
    }

    #[test]
    fn test_put_rule_replaces_and_delete() {
        let store = store();
        store
            .put_rule(&RevisionRule::new("web", "^web", "aaa", 1))
            .unwrap();
        store
            .put_rule(&RevisionRule::new("web", "^web", "bbb", 3))
            .unwrap();

        let rules = store.rules_for_package_blocking("web").unwrap();
        assert_eq!(rules, vec![RevisionRule::new("web", "^web", "bbb", 3)]);

        assert!(store.delete_rule("web", "^web").unwrap());
        assert!(!store.delete_rule("web", "^web").unwrap());
        assert!(store.rules_for_package_blocking("web").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_async_trait_roundtrip() {
        let store = store();
        store
            .put_rule(&RevisionRule::new("web", "^web", "aaa", 1))
            .unwrap();

        store
            .upsert_report(&PhonehomeRecord::new("web", "web1", "aaa", ""))
            .await
            .unwrap();
        let rules = store.rules_for_package("web").await.unwrap();

        assert_eq!(rules.len(), 1);
        assert!(store.get_record("web", "web1").unwrap().is_some());
    }
}
