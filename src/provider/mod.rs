//! Gateway list providers
//!
//! A gateway list is plain text: one hostname per line, blank lines and
//! `#` comments ignored.

mod fetcher;

pub use fetcher::HttpFetcher;

use crate::Result;
use async_trait::async_trait;
use std::path::Path;

/// Source of raw gateway list content for a repository
#[async_trait]
pub trait GatewaySource: Send + Sync {
    async fn fetch(&self, owner: &str, repo: &str) -> Result<String>;
}

/// Parse gateway list content into hostnames, keeping order and duplicates
pub fn parse_gateways(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Read and parse a gateway list file
pub async fn load_gateways_file<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(parse_gateways(&content))
}
