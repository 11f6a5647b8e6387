pub mod sqlite;

use chrono::NaiveDate;

use crate::app::Result;
use crate::domain::{CacheEntry, ItemId};

pub use sqlite::SqliteStore;

/// Derivation version of the submission cache. Bump whenever the meaning of
/// cached values changes; a mismatched store is purged on startup.
pub const CACHE_VERSION: &str = "2";

pub trait Store {
    // Submission cache
    fn get_cached(&self, id: &ItemId) -> Result<Option<CacheEntry>>;
    fn put_cached(&self, id: &ItemId, entry: &CacheEntry) -> Result<()>;
    fn remove_cached(&self, id: &ItemId) -> Result<()>;
    fn purge_cache(&self) -> Result<()>;
    fn cache_version(&self) -> Result<Option<String>>;
    fn set_cache_version(&self, version: &str) -> Result<()>;

    // Preferences (survive cache purges)
    fn threshold(&self) -> Result<Option<NaiveDate>>;
    fn set_threshold(&self, threshold: Option<NaiveDate>) -> Result<()>;
    fn excluded_groups(&self) -> Result<Vec<String>>;
    fn set_excluded_groups(&self, names: &[String]) -> Result<()>;
}

/// Startup version check. A mismatch wipes every cached entry (preferences
/// and the version key survive) and rewrites the tag. Invalidation is
/// all-or-nothing; individual entries are never aged out.
pub fn ensure_cache_version(store: &dyn Store, expected: &str) -> Result<()> {
    if store.cache_version()?.as_deref() != Some(expected) {
        tracing::info!("cache version changed, purging cached lookups");
        store.purge_cache()?;
        store.set_cache_version(expected)?;
    }
    Ok(())
}
