use std::sync::Arc;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::app::Result;
use crate::domain::{CacheEntry, ItemId, SubmissionMeta};
use crate::fetcher::Fetcher;
use crate::store::Store;

/// Resolves an item's most recent submission, consulting the cache first and
/// falling back to a remote lookup against the judge's per-problem status
/// page. Every outcome except a failed fetch is written back to the cache,
/// so concurrent consumers (filter pass, aggregation pass) both benefit.
pub struct SubmissionResolver {
    store: Arc<dyn Store + Send + Sync>,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    base_url: String,
    timestamp_re: Regex,
}

impl SubmissionResolver {
    pub fn new(
        store: Arc<dyn Store + Send + Sync>,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            fetcher,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timestamp_re: Regex::new(r"(\d{4}-\d{2}-\d{2})\s+(\d{2}:\d{2}:\d{2})")
                .expect("valid timestamp pattern"),
        }
    }

    pub fn lookup_url(&self, id: &ItemId) -> String {
        format!("{}/{}/", self.base_url, id)
    }

    /// Cache-or-fetch resolution.
    ///
    /// A transport or HTTP failure resolves to "unknown" without touching the
    /// cache, so the next call retries; there is no backoff. An unparseable
    /// body is a confirmed "no submissions" result and is cached as such —
    /// only a forced refresh will look again.
    pub async fn resolve(&self, id: &ItemId) -> Result<SubmissionMeta> {
        if let Some(entry) = self.store.get_cached(id)? {
            return Ok(entry.meta());
        }

        let url = self.lookup_url(id);
        let body = match self.fetcher.fetch_text(&url).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("lookup for {} failed: {}", id, e);
                return Ok(SubmissionMeta::unknown());
            }
        };

        let entry = match self.extract_timestamp(&body) {
            Some(ts) => CacheEntry::Resolved(ts),
            None => CacheEntry::ConfirmedEmpty,
        };
        self.store.put_cached(id, &entry)?;
        Ok(entry.meta())
    }

    /// Drop the cached entry first, guaranteeing a fresh remote lookup.
    pub async fn force_refresh(&self, id: &ItemId) -> Result<SubmissionMeta> {
        self.store.remove_cached(id)?;
        self.resolve(id).await
    }

    /// First `YYYY-MM-DD HH:MM:SS`-shaped substring in the body, read as
    /// judge-local time. The status page lists submissions newest first, so
    /// the first match is the most recent one.
    fn extract_timestamp(&self, body: &str) -> Option<NaiveDateTime> {
        let caps = self.timestamp_re.captures(body)?;
        let raw = format!("{} {}", &caps[1], &caps[2]);
        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S").ok()
    }
}
