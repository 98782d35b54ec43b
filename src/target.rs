//! Targets: the first stage of the connection curry.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use tracing::warn;

use crate::config::ConfigStore;
use crate::error::SqlCurryError;
use crate::types::DatabaseType;

/// Category under which connection strings are stored in the bootstrap table.
pub const CONNECTION_STRING_CATEGORY: &str = "C_ConnStr";

/// Connection bookkeeping shared by clones of one target.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    open: AtomicUsize,
    opened_total: AtomicU64,
}

impl ConnectionStats {
    pub(crate) fn opened(&self) {
        self.open.fetch_add(1, Ordering::SeqCst);
        self.opened_total.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn closed(&self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

/// An immutable named connection endpoint.
#[derive(Debug, Clone)]
pub struct Target {
    name: String,
    connection_string: Option<String>,
    database_type: DatabaseType,
    timeout: Option<Duration>,
    stats: Arc<ConnectionStats>,
}

impl Target {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        connection_string: Option<String>,
        database_type: DatabaseType,
    ) -> Self {
        Self {
            name: name.into(),
            connection_string,
            database_type,
            timeout: None,
            stats: Arc::new(ConnectionStats::default()),
        }
    }

    /// Pass a timeout through to the driver: the `SQLite` busy timeout, or the SQL Server
    /// connect timeout. `None` keeps the driver default.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn database_type(&self) -> DatabaseType {
        self.database_type
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.connection_string.is_some()
    }

    /// The connection string, or [`SqlCurryError::UnresolvedTarget`] naming this target.
    ///
    /// # Errors
    /// Fails when the target was built without a connection string.
    pub fn connection_string(&self) -> Result<&str, SqlCurryError> {
        self.connection_string
            .as_deref()
            .ok_or_else(|| SqlCurryError::UnresolvedTarget {
                name: self.name.clone(),
            })
    }

    /// Connections currently open against this target.
    #[must_use]
    pub fn open_connections(&self) -> usize {
        self.stats.open.load(Ordering::SeqCst)
    }

    /// Connections opened against this target since it was created.
    #[must_use]
    pub fn total_connections(&self) -> u64 {
        self.stats.opened_total.load(Ordering::SeqCst)
    }

    pub(crate) fn stats(&self) -> &Arc<ConnectionStats> {
        &self.stats
    }
}

/// The logical databases the application talks to, resolved once at startup.
#[derive(Debug, Clone)]
pub struct TargetRegistry {
    pub logs: Target,
    pub jics: Target,
    pub powerfaids: Target,
    pub irb: Target,
    pub irb_dev: Target,
    pub forms: Target,
}

impl TargetRegistry {
    /// Registry names paired with their `C_ConnStr` keys.
    pub const KEYS: [(&'static str, &'static str); 6] = [
        ("logs", "dblog_ms"),
        ("jics", "jicsdb_ms"),
        ("powerfaids", "powerfaidsdb_ms"),
        ("irb", "irb_ms"),
        ("irb_dev", "irbdev_ms"),
        ("forms", "formsdb_ms"),
    ];

    /// Resolve every target through the config store.
    ///
    /// A missing key leaves that target unresolved; it fails when first used.
    ///
    /// # Errors
    /// Propagates config store failures, which are fatal at startup.
    pub fn load(store: &ConfigStore, database_type: DatabaseType) -> Result<Self, SqlCurryError> {
        let resolve = |name: &str, key: &str| -> Result<Target, SqlCurryError> {
            let conn_str = store.value(CONNECTION_STRING_CATEGORY, key)?;
            if conn_str.is_none() {
                warn!(target_name = name, key, "no connection string configured");
            }
            Ok(Target::new(name, conn_str, database_type))
        };
        let [logs, jics, powerfaids, irb, irb_dev, forms] = Self::KEYS;
        Ok(Self {
            logs: resolve(logs.0, logs.1)?,
            jics: resolve(jics.0, jics.1)?,
            powerfaids: resolve(powerfaids.0, powerfaids.1)?,
            irb: resolve(irb.0, irb.1)?,
            irb_dev: resolve(irb_dev.0, irb_dev.1)?,
            forms: resolve(forms.0, forms.1)?,
        })
    }

    /// Every target, in registry order.
    #[must_use]
    pub fn all(&self) -> [&Target; 6] {
        [
            &self.logs,
            &self.jics,
            &self.powerfaids,
            &self.irb,
            &self.irb_dev,
            &self.forms,
        ]
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Target> {
        self.all().into_iter().find(|t| t.name() == name)
    }

    /// Targets that have no connection string.
    #[must_use]
    pub fn unresolved(&self) -> Vec<&Target> {
        self.all().into_iter().filter(|t| !t.is_resolved()).collect()
    }

    /// Fail if any target is unresolved.
    ///
    /// # Errors
    /// Returns [`SqlCurryError::ConfigError`] listing the unresolved targets.
    pub fn require_all(self) -> Result<Self, SqlCurryError> {
        let missing: Vec<&str> = self.unresolved().iter().map(|t| t.name()).collect();
        if missing.is_empty() {
            Ok(self)
        } else {
            Err(SqlCurryError::ConfigError(format!(
                "unresolved targets: {}",
                missing.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_target_names_itself() {
        let target = Target::new("forms", None, DatabaseType::Mssql);
        match target.connection_string() {
            Err(SqlCurryError::UnresolvedTarget { name }) => assert_eq!(name, "forms"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn clones_share_connection_stats() {
        let target = Target::new("logs", Some(":memory:".into()), DatabaseType::Sqlite);
        let clone = target.clone();
        clone.stats().opened();
        assert_eq!(target.open_connections(), 1);
        clone.stats().closed();
        assert_eq!(target.open_connections(), 0);
        assert_eq!(target.total_connections(), 1);
    }
}
