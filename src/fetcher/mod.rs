pub mod http_fetcher;
pub mod scheduler;

use async_trait::async_trait;

use crate::app::Result;

pub use http_fetcher::HttpFetcher;
pub use scheduler::FetchScheduler;

/// One page fetch. Implementations return the response body on success and
/// an error for any transport failure or non-success status.
#[async_trait]
pub trait Fetcher {
    async fn fetch_text(&self, url: &str) -> Result<String>;
}
