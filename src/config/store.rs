use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::clock::{Clock, SystemClock};
use crate::command::CommandSpec;
use crate::error::SqlCurryError;
use crate::executor;
use crate::target::Target;
use crate::types::{CommandKind, DatabaseType, RowValues};

/// How long a fetched snapshot is served before the table is read again.
pub const CONFIG_TTL: Duration = Duration::from_secs(60);

/// The unparameterized query that reads the whole bootstrap table.
pub const CONFIG_TABLE_QUERY: &str = "select * from [dbo].FWK_ConfigSettings;";

/// The same read for a `SQLite` bootstrap database, which has no `dbo` schema.
const SQLITE_CONFIG_TABLE_QUERY: &str = "select * from FWK_ConfigSettings;";

/// One row of the bootstrap configuration table.
///
/// Every column is kept, in table order. Columns that are not strings in the database are
/// stored as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigRow {
    columns: Vec<(String, Option<String>)>,
}

impl ConfigRow {
    #[must_use]
    pub fn new(columns: Vec<(String, Option<String>)>) -> Self {
        Self { columns }
    }

    /// Shorthand for a row holding only `Category`, `Key` and `Value`.
    #[must_use]
    pub fn entry(category: &str, key: &str, value: Option<&str>) -> Self {
        Self::new(vec![
            ("Category".into(), Some(category.into())),
            ("Key".into(), Some(key.into())),
            ("Value".into(), value.map(Into::into)),
        ])
    }

    /// Value of a column. `None` when the column is missing or not a string.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .and_then(|(_, value)| value.as_deref())
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.get("Category")
    }

    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.get("Key")
    }

    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.get("Value")
    }

    #[must_use]
    pub fn columns(&self) -> &[(String, Option<String>)] {
        &self.columns
    }
}

/// An immutable copy of the bootstrap table and the instant it was read.
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    rows: Vec<ConfigRow>,
    fetched_at: Instant,
}

impl ConfigSnapshot {
    #[must_use]
    pub fn rows(&self) -> &[ConfigRow] {
        &self.rows
    }

    #[must_use]
    pub fn fetched_at(&self) -> Instant {
        self.fetched_at
    }

    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.fetched_at) < ttl
    }

    /// First row whose category and key match exactly.
    #[must_use]
    pub fn find(&self, category: &str, key: &str) -> Option<&ConfigRow> {
        self.rows
            .iter()
            .find(|row| row.category() == Some(category) && row.key() == Some(key))
    }
}

/// Where configuration rows come from.
pub trait ConfigSource: Send + Sync {
    /// Read every row of the configuration table, in table order.
    ///
    /// # Errors
    /// Returns the connectivity or execution error of the underlying read.
    fn fetch_rows(&self) -> Result<Vec<ConfigRow>, SqlCurryError>;
}

/// Reads `[dbo].FWK_ConfigSettings` from the bootstrap database.
#[derive(Debug, Clone)]
pub struct BootstrapSource {
    target: Target,
    query: String,
}

impl BootstrapSource {
    #[must_use]
    pub fn new(target: Target) -> Self {
        let query = match target.database_type() {
            DatabaseType::Mssql => CONFIG_TABLE_QUERY,
            DatabaseType::Sqlite => SQLITE_CONFIG_TABLE_QUERY,
        };
        Self {
            target,
            query: query.to_string(),
        }
    }

    /// Replace the table query.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    #[must_use]
    pub fn target(&self) -> &Target {
        &self.target
    }
}

impl ConfigSource for BootstrapSource {
    fn fetch_rows(&self) -> Result<Vec<ConfigRow>, SqlCurryError> {
        let spec = CommandSpec::new(self.query.as_str(), CommandKind::Text);
        executor::with_cursor(&self.target, &spec, |cursor| {
            let mut rows = Vec::new();
            while let Some(values) = cursor.next_row()? {
                let columns = cursor
                    .columns()
                    .iter()
                    .cloned()
                    .zip(values)
                    .map(|(name, value)| match value {
                        RowValues::Text(s) => (name, Some(s)),
                        _ => (name, None),
                    })
                    .collect();
                rows.push(ConfigRow::new(columns));
            }
            Ok(rows)
        })
    }
}

/// Cached access to the bootstrap configuration.
///
/// The snapshot is swapped whole behind an `Arc`, so readers see either the previous or the
/// new snapshot. Two callers missing the cache at once may both read the table; the last
/// one to finish wins.
pub struct ConfigStore {
    source: Box<dyn ConfigSource>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    snapshot: RwLock<Option<Arc<ConfigSnapshot>>>,
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("ttl", &self.ttl)
            .field("cached", &self.cached().is_some())
            .finish_non_exhaustive()
    }
}

impl ConfigStore {
    #[must_use]
    pub fn new(source: impl ConfigSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            clock: Arc::new(SystemClock),
            ttl: CONFIG_TTL,
            snapshot: RwLock::new(None),
        }
    }

    /// Store backed by the bootstrap database at `target`.
    #[must_use]
    pub fn bootstrap(target: Target) -> Self {
        Self::new(BootstrapSource::new(target))
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn cached(&self) -> Option<Arc<ConfigSnapshot>> {
        let guard = match self.snapshot.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.clone()
    }

    fn store(&self, snapshot: Arc<ConfigSnapshot>) {
        let mut guard = match self.snapshot.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(snapshot);
    }

    /// The configuration rows, from cache when allowed and fresh.
    ///
    /// # Errors
    /// Returns [`SqlCurryError::NoConfigData`] when the table is empty, or the source's error.
    pub fn fetch_all(&self, use_cache: bool) -> Result<Arc<ConfigSnapshot>, SqlCurryError> {
        if use_cache {
            if let Some(snapshot) = self.cached() {
                if snapshot.is_fresh(self.clock.now(), self.ttl) {
                    debug!("config snapshot served from cache");
                    return Ok(snapshot);
                }
            }
        }

        let rows = self.source.fetch_rows()?;
        if rows.is_empty() {
            return Err(SqlCurryError::NoConfigData);
        }
        info!(rows = rows.len(), "fetched configuration snapshot");

        let snapshot = Arc::new(ConfigSnapshot {
            rows,
            fetched_at: self.clock.now(),
        });
        self.store(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// `Value` of the first row matching `category` and `key` exactly.
    ///
    /// # Errors
    /// Propagates [`ConfigStore::fetch_all`] failures.
    pub fn value(&self, category: &str, key: &str) -> Result<Option<String>, SqlCurryError> {
        let snapshot = self.fetch_all(true)?;
        Ok(snapshot
            .find(category, key)
            .and_then(|row| row.value().map(str::to_string)))
    }

    /// Every `(Key, Value)` pair of one category, in table order.
    ///
    /// # Errors
    /// Propagates [`ConfigStore::fetch_all`] failures.
    pub fn category(&self, category: &str) -> Result<Vec<(String, Option<String>)>, SqlCurryError> {
        let snapshot = self.fetch_all(true)?;
        Ok(snapshot
            .rows()
            .iter()
            .filter(|row| row.category() == Some(category))
            .filter_map(|row| {
                row.key()
                    .map(|key| (key.to_string(), row.value().map(str::to_string)))
            })
            .collect())
    }

    /// Drop the cached snapshot; the next read goes to the source.
    pub fn invalidate(&self) {
        let mut guard = match self.snapshot.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = None;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::config::ManualClock;

    struct CountingSource {
        rows: Vec<ConfigRow>,
        fetches: Arc<AtomicUsize>,
    }

    impl ConfigSource for CountingSource {
        fn fetch_rows(&self) -> Result<Vec<ConfigRow>, SqlCurryError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.rows.clone())
        }
    }

    fn store_with(rows: Vec<ConfigRow>) -> (ConfigStore, Arc<AtomicUsize>, Arc<ManualClock>) {
        let fetches = Arc::new(AtomicUsize::new(0));
        let clock = Arc::new(ManualClock::new());
        let store = ConfigStore::new(CountingSource {
            rows,
            fetches: Arc::clone(&fetches),
        })
        .with_clock(clock.clone());
        (store, fetches, clock)
    }

    fn sample() -> Vec<ConfigRow> {
        vec![
            ConfigRow::entry("C_ConnStr", "dblog_ms", Some("first")),
            ConfigRow::entry("Other", "dblog_ms", Some("other")),
            ConfigRow::entry("C_ConnStr", "dblog_ms", Some("second")),
            ConfigRow::entry("C_ConnStr", "forms_ms", None),
        ]
    }

    #[test]
    fn second_read_within_ttl_hits_cache() {
        let (store, fetches, clock) = store_with(sample());
        store.value("C_ConnStr", "dblog_ms").unwrap();
        clock.advance(Duration::from_secs(59));
        store.value("C_ConnStr", "dblog_ms").unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn expired_snapshot_is_refetched() {
        let (store, fetches, clock) = store_with(sample());
        store.value("C_ConnStr", "dblog_ms").unwrap();
        clock.advance(CONFIG_TTL);
        store.value("C_ConnStr", "dblog_ms").unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn bypassing_the_cache_always_fetches() {
        let (store, fetches, _clock) = store_with(sample());
        store.fetch_all(false).unwrap();
        store.fetch_all(false).unwrap();
        store.fetch_all(true).unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn invalidate_forces_a_fetch() {
        let (store, fetches, _clock) = store_with(sample());
        store.fetch_all(true).unwrap();
        store.invalidate();
        store.fetch_all(true).unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn first_duplicate_wins_and_missing_is_none() {
        let (store, _, _) = store_with(sample());
        assert_eq!(
            store.value("C_ConnStr", "dblog_ms").unwrap().as_deref(),
            Some("first")
        );
        assert_eq!(store.value("C_ConnStr", "nope").unwrap(), None);
        assert_eq!(store.value("c_connstr", "dblog_ms").unwrap(), None);
        assert_eq!(store.value("C_ConnStr", "forms_ms").unwrap(), None);
    }

    #[test]
    fn category_lists_pairs_in_order() {
        let (store, _, _) = store_with(sample());
        let pairs = store.category("C_ConnStr").unwrap();
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["dblog_ms", "dblog_ms", "forms_ms"]);
    }

    /// Every fetch returns rows stamped with the same generation number.
    struct GenerationSource {
        fetches: Arc<AtomicUsize>,
    }

    impl ConfigSource for GenerationSource {
        fn fetch_rows(&self) -> Result<Vec<ConfigRow>, SqlCurryError> {
            let generation = (self.fetches.fetch_add(1, Ordering::SeqCst) + 1).to_string();
            std::thread::yield_now();
            Ok(["dblog_ms", "jicsdb_ms", "formsdb_ms"]
                .into_iter()
                .map(|key| ConfigRow::entry("C_ConnStr", key, Some(&generation)))
                .collect())
        }
    }

    #[test]
    fn concurrent_readers_see_whole_snapshots() {
        const READERS: usize = 8;
        let fetches = Arc::new(AtomicUsize::new(0));
        let store = ConfigStore::new(GenerationSource {
            fetches: Arc::clone(&fetches),
        });
        let store = &store;

        std::thread::scope(|scope| {
            let readers: Vec<_> = (0..READERS)
                .map(|i| scope.spawn(move || store.fetch_all(i % 2 == 0).unwrap()))
                .collect();
            scope.spawn(move || {
                for _ in 0..50 {
                    store.invalidate();
                    std::thread::yield_now();
                }
            });
            for reader in readers {
                let snapshot = reader.join().unwrap();
                let generations: Vec<&str> =
                    snapshot.rows().iter().filter_map(|row| row.value()).collect();
                assert_eq!(generations.len(), 3);
                assert!(generations.iter().all(|g| *g == generations[0]));
            }
        });

        let total = fetches.load(Ordering::SeqCst);
        assert!((1..=READERS).contains(&total), "fetched {total} times");

        let cached = store.value("C_ConnStr", "jicsdb_ms").unwrap();
        assert!(cached.is_some());
    }

    #[test]
    fn empty_table_is_fatal() {
        let (store, _, _) = store_with(vec![]);
        let err = store.value("C_ConnStr", "dblog_ms").unwrap_err();
        assert!(matches!(err, SqlCurryError::NoConfigData));
        assert!(err.is_config_fatal());
    }
}
