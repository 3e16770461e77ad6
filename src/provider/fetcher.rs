//! HTTP fetcher for gateway lists hosted on GitHub

use super::GatewaySource;
use crate::config::ServerConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Downloads `gateways.txt` from a URL template
pub struct HttpFetcher {
    client: reqwest::Client,
    url_template: String,
}

impl HttpFetcher {
    pub fn new(url_template: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::fetch(e.to_string()))?;

        Ok(HttpFetcher {
            client,
            url_template: url_template.into(),
        })
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        Self::new(config.url_template.clone(), config.fetch_timeout())
    }

    /// Raw file URL for a repository
    pub fn url(&self, owner: &str, repo: &str) -> Result<url::Url> {
        let raw = self
            .url_template
            .replace("{owner}", owner)
            .replace("{repo}", repo);
        url::Url::parse(&raw).map_err(|e| Error::fetch(format!("invalid URL {}: {}", raw, e)))
    }
}

#[async_trait]
impl GatewaySource for HttpFetcher {
    async fn fetch(&self, owner: &str, repo: &str) -> Result<String> {
        let url = self.url(owner, repo)?;
        debug!("Fetching gateway list from {}", url);

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::fetch(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::fetch(e.to_string()))?;

        resp.text().await.map_err(|e| Error::fetch(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_substitution() {
        let fetcher = HttpFetcher::from_config(&ServerConfig::default()).unwrap();
        let url = fetcher.url("acme", "pugwips").unwrap();
        assert_eq!(
            url.as_str(),
            "https://raw.githubusercontent.com/acme/pugwips/main/gateways.txt"
        );
    }

    #[test]
    fn test_invalid_url() {
        let fetcher = HttpFetcher::new("not a url/{owner}/{repo}", Duration::from_secs(1)).unwrap();
        assert!(matches!(fetcher.url("a", "b"), Err(Error::Fetch(_))));
    }

    #[tokio::test]
    async fn test_fetch_connection_failure() {
        // Port 9 (discard) on localhost is expected to refuse connections
        let fetcher =
            HttpFetcher::new("http://127.0.0.1:9/{owner}/{repo}", Duration::from_secs(2)).unwrap();
        let err = fetcher.fetch("acme", "pugwips").await.unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));
    }
}
