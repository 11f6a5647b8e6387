use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::Client;

use crate::app::Result;
use crate::fetcher::Fetcher;

pub struct HttpFetcher {
    client: Client,
    cookie: Option<String>,
}

impl HttpFetcher {
    /// `cookie` carries the judge session credential; lookups against pages
    /// that require login return no timestamps without it.
    pub fn new(cookie: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .user_agent("scoreline/0.1.0")
            .build()
            .expect("Failed to build HTTP client");

        Self { client, cookie }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let mut request = self.client.get(url);
        if let Some(cookie) = &self.cookie {
            request = request.header(COOKIE, cookie.as_str());
        }

        let response = request.send().await?;
        let response = response.error_for_status()?;
        Ok(response.text().await?)
    }
}
