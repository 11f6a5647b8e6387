use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use rusqlite_migration::{Migrations, M};

use crate::app::{Result, ScorelineError};
use crate::domain::{CacheEntry, ItemId};
use crate::store::Store;

const ENTRY_PREFIX: &str = "sub:";
const VERSION_KEY: &str = "sub:__version";
const THRESHOLD_KEY: &str = "pref:threshold";
const EXCLUDED_KEY: &str = "pref:excluded";
const THRESHOLD_FORMAT: &str = "%Y-%m-%d";

/// Key-value store backed by a single SQLite table. Cached lookups live
/// under `sub:{id}`, the cache version under `sub:__version`, and user
/// preferences under `pref:*` keys so a version purge leaves them intact.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|_| ScorelineError::Database(rusqlite::Error::InvalidQuery))?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            ScorelineError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn entry_key(id: &ItemId) -> String {
        format!("{}{}", ENTRY_PREFIX, id)
    }

    fn get_value(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM cache WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_value(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO cache (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    fn delete_value(&self, key: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM cache WHERE key = ?1", params![key])?;
        Ok(())
    }
}

impl Store for SqliteStore {
    fn get_cached(&self, id: &ItemId) -> Result<Option<CacheEntry>> {
        match self.get_value(&Self::entry_key(id))? {
            Some(raw) => {
                let entry = CacheEntry::from_stored(&raw);
                if entry.is_none() {
                    tracing::debug!("discarding corrupt cache value for {}: {}", id, raw);
                }
                Ok(entry)
            }
            None => Ok(None),
        }
    }

    fn put_cached(&self, id: &ItemId, entry: &CacheEntry) -> Result<()> {
        self.set_value(&Self::entry_key(id), &entry.to_stored())
    }

    fn remove_cached(&self, id: &ItemId) -> Result<()> {
        self.delete_value(&Self::entry_key(id))
    }

    fn purge_cache(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM cache WHERE key LIKE ?1 AND key <> ?2",
            params![format!("{}%", ENTRY_PREFIX), VERSION_KEY],
        )?;
        Ok(())
    }

    fn cache_version(&self) -> Result<Option<String>> {
        self.get_value(VERSION_KEY)
    }

    fn set_cache_version(&self, version: &str) -> Result<()> {
        self.set_value(VERSION_KEY, version)
    }

    fn threshold(&self) -> Result<Option<NaiveDate>> {
        Ok(self
            .get_value(THRESHOLD_KEY)?
            .and_then(|s| NaiveDate::parse_from_str(&s, THRESHOLD_FORMAT).ok()))
    }

    fn set_threshold(&self, threshold: Option<NaiveDate>) -> Result<()> {
        match threshold {
            Some(date) => self.set_value(THRESHOLD_KEY, &date.format(THRESHOLD_FORMAT).to_string()),
            None => self.delete_value(THRESHOLD_KEY),
        }
    }

    fn excluded_groups(&self) -> Result<Vec<String>> {
        match self.get_value(EXCLUDED_KEY)? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(names) => Ok(names),
                Err(e) => {
                    tracing::debug!("discarding corrupt exclusion list: {}", e);
                    Ok(Vec::new())
                }
            },
            None => Ok(Vec::new()),
        }
    }

    fn set_excluded_groups(&self, names: &[String]) -> Result<()> {
        self.set_value(EXCLUDED_KEY, &serde_json::to_string(names)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ensure_cache_version;
    use chrono::NaiveDateTime;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_cache_round_trip() {
        let store = SqliteStore::in_memory().unwrap();
        let id = ItemId::new("1068");
        let entry = CacheEntry::Resolved(ts("2024-05-17 19:23:01"));

        store.put_cached(&id, &entry).unwrap();
        assert_eq!(store.get_cached(&id).unwrap(), Some(entry));
    }

    #[test]
    fn test_sentinel_round_trip() {
        let store = SqliteStore::in_memory().unwrap();
        let id = ItemId::new("42");

        store.put_cached(&id, &CacheEntry::ConfirmedEmpty).unwrap();
        assert_eq!(
            store.get_cached(&id).unwrap(),
            Some(CacheEntry::ConfirmedEmpty)
        );
    }

    #[test]
    fn test_missing_entry_is_none() {
        let store = SqliteStore::in_memory().unwrap();
        assert_eq!(store.get_cached(&ItemId::new("nope")).unwrap(), None);
    }

    #[test]
    fn test_remove_entry() {
        let store = SqliteStore::in_memory().unwrap();
        let id = ItemId::new("7");
        store.put_cached(&id, &CacheEntry::ConfirmedEmpty).unwrap();
        store.remove_cached(&id).unwrap();
        assert_eq!(store.get_cached(&id).unwrap(), None);
    }

    #[test]
    fn test_purge_spares_version_and_preferences() {
        let store = SqliteStore::in_memory().unwrap();
        store.set_cache_version("2").unwrap();
        store
            .put_cached(&ItemId::new("1"), &CacheEntry::ConfirmedEmpty)
            .unwrap();
        store
            .set_threshold(NaiveDate::from_ymd_opt(2024, 6, 1))
            .unwrap();
        store.set_excluded_groups(&["archive".into()]).unwrap();

        store.purge_cache().unwrap();

        assert_eq!(store.get_cached(&ItemId::new("1")).unwrap(), None);
        assert_eq!(store.cache_version().unwrap().as_deref(), Some("2"));
        assert_eq!(
            store.threshold().unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 1)
        );
        assert_eq!(store.excluded_groups().unwrap(), vec!["archive".to_string()]);
    }

    #[test]
    fn test_version_mismatch_purges_on_startup() {
        let store = SqliteStore::in_memory().unwrap();
        store.set_cache_version("1").unwrap();
        store
            .put_cached(&ItemId::new("1068"), &CacheEntry::ConfirmedEmpty)
            .unwrap();

        ensure_cache_version(&store, "2").unwrap();

        assert_eq!(store.get_cached(&ItemId::new("1068")).unwrap(), None);
        assert_eq!(store.cache_version().unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_version_match_keeps_entries() {
        let store = SqliteStore::in_memory().unwrap();
        store.set_cache_version("2").unwrap();
        let id = ItemId::new("1068");
        store.put_cached(&id, &CacheEntry::ConfirmedEmpty).unwrap();

        ensure_cache_version(&store, "2").unwrap();

        assert_eq!(
            store.get_cached(&id).unwrap(),
            Some(CacheEntry::ConfirmedEmpty)
        );
    }

    #[test]
    fn test_corrupt_value_reads_as_miss() {
        let store = SqliteStore::in_memory().unwrap();
        store.set_value("sub:bad", "not-a-date").unwrap();
        assert_eq!(store.get_cached(&ItemId::new("bad")).unwrap(), None);
    }

    #[test]
    fn test_threshold_round_trip() {
        let store = SqliteStore::in_memory().unwrap();
        assert_eq!(store.threshold().unwrap(), None);

        let date = NaiveDate::from_ymd_opt(2024, 6, 1);
        store.set_threshold(date).unwrap();
        assert_eq!(store.threshold().unwrap(), date);

        store.set_threshold(None).unwrap();
        assert_eq!(store.threshold().unwrap(), None);
    }

    #[test]
    fn test_excluded_groups_round_trip() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.excluded_groups().unwrap().is_empty());

        let names = vec!["archive".to_string(), "warmups".to_string()];
        store.set_excluded_groups(&names).unwrap();
        assert_eq!(store.excluded_groups().unwrap(), names);
    }

    #[test]
    fn test_last_write_wins() {
        let store = SqliteStore::in_memory().unwrap();
        let id = ItemId::new("9");
        store.put_cached(&id, &CacheEntry::ConfirmedEmpty).unwrap();
        let entry = CacheEntry::Resolved(ts("2024-01-02 03:04:05"));
        store.put_cached(&id, &entry).unwrap();
        assert_eq!(store.get_cached(&id).unwrap(), Some(entry));
    }
}
