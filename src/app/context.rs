use std::path::PathBuf;
use std::sync::Arc;

use crate::aggregate::Aggregator;
use crate::app::error::{Result, ScorelineError};
use crate::config::Config;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::Fetcher;
use crate::resolver::SubmissionResolver;
use crate::roster::TomlRoster;
use crate::store::sqlite::SqliteStore;
use crate::store::{self, CACHE_VERSION};
use crate::tracker::Tracker;

pub struct AppContext {
    pub store: Arc<SqliteStore>,
    pub roster: Arc<TomlRoster>,
    pub resolver: Arc<SubmissionResolver>,
    pub tracker: Arc<Tracker>,
}

impl AppContext {
    pub fn new(config: &Config, roster_override: Option<PathBuf>) -> Result<Self> {
        let db_path = match &config.db_path {
            Some(p) => p.clone(),
            None => Self::default_db_path()?,
        };
        let store = Arc::new(SqliteStore::new(&db_path)?);
        store::ensure_cache_version(store.as_ref(), CACHE_VERSION)?;

        let roster_path = match roster_override {
            Some(p) => p,
            None => config.roster_path()?,
        };
        let roster = Arc::new(TomlRoster::load(&roster_path)?);

        let fetcher: Arc<dyn Fetcher + Send + Sync> =
            Arc::new(HttpFetcher::new(config.remote.cookie.clone()));
        let resolver = Arc::new(SubmissionResolver::new(
            store.clone(),
            fetcher,
            &config.remote.base_url,
        ));
        let aggregator = Arc::new(Aggregator::new(store.clone())?);
        let tracker = Arc::new(Tracker::with_workers(
            roster.clone(),
            resolver.clone(),
            aggregator,
            config.scheduler.filter_workers,
            config.scheduler.background_workers,
        ));

        Ok(Self {
            store,
            roster,
            resolver,
            tracker,
        })
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| ScorelineError::Other("Could not find data directory".into()))?;
        let scoreline_dir = data_dir.join("scoreline");
        std::fs::create_dir_all(&scoreline_dir)?;
        Ok(scoreline_dir.join("scoreline.db"))
    }
}
