//! Gateway Resolver - concurrent VPN gateway DNS resolution
//!
//! Resolves a list of gateway hostnames to their IPv4 addresses with a
//! bounded number of lookups in flight, then renders the results as:
//! - a JSON report
//! - a plain IP list
//! - an Azure IP group document
//! - Bicep and Terraform templates
//!
//! # Architecture
//!
//! ```text
//!   +--------------+      +--------------+
//!   |  main (CLI)  |      | hub/ (HTTP)  |
//!   +------+-------+      +------+-------+
//!          |                     |
//!          |  +------------------+-------+
//!          |  |                          |
//!   +------v--v----+            +--------v-----+
//!   |     dns/     |            |  provider/   |
//!   |  (Resolver)  |            | (gateway src)|
//!   +------+-------+            +--------------+
//!          |
//!   +------v-------+
//!   |   render/    |
//!   +--------------+
//! ```

pub mod common;
pub mod config;
pub mod dns;
pub mod hub;
pub mod provider;
pub mod render;

pub use common::error::{Error, LookupError, Result};
pub use config::Config;

use dns::{Resolver, ResultSet};
use render::{FormatSelection, RenderOptions};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Wires configuration, resolver and front-ends together
pub struct App {
    config: Config,
    resolver: Resolver,
}

impl App {
    /// Validate configuration and build the resolver
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let resolver = Resolver::from_config(&config.resolver)?;
        info!(
            "Resolver initialized ({:?} backend, {} workers)",
            config.resolver.backend, config.resolver.workers
        );
        Ok(App { config, resolver })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Resolve every hostname in the configured gateway file
    pub async fn resolve_file(&self) -> Result<ResultSet> {
        let input = &self.config.output.input;
        info!("Parsing gateways from {}...", input.display());
        let hostnames = provider::load_gateways_file(input).await?;
        info!("Found {} gateways to resolve", hostnames.len());

        let workers = self.config.resolver.workers;
        info!("Resolving DNS with {} workers...", workers);
        let results = self.resolver.resolve_all(&hostnames, workers).await?;

        info!(
            "Resolution complete: {} successful, {} failed",
            results.successful_count(),
            results.failed_count()
        );
        for failure in results.failures() {
            warn!("  - {}: {}", failure.hostname(), failure.error().unwrap_or_default());
        }

        Ok(results)
    }

    /// Write the configured formats to the output directory
    pub async fn write_outputs(&self, results: &ResultSet) -> Result<Vec<PathBuf>> {
        let output = &self.config.output;
        let formats = FormatSelection::expand(&output.formats);
        let opts = RenderOptions::new(output.ip_group_name.clone());
        render::write_outputs(results, &formats, &output.dir, &opts).await
    }

    /// Batch mode: resolve the gateway file and write every selected format
    pub async fn run_batch(&self) -> Result<Vec<PathBuf>> {
        let results = self.resolve_file().await?;
        let written = self.write_outputs(&results).await?;
        info!("Done!");
        Ok(written)
    }

    /// Shared state for the HTTP front-end
    pub fn app_state(&self) -> Result<hub::AppState> {
        let fetcher = provider::HttpFetcher::from_config(&self.config.server)?;
        Ok(hub::AppState::new(
            &self.config,
            self.resolver.clone(),
            Arc::new(fetcher),
        ))
    }

    /// Server mode: answer resolution requests until shutdown
    pub async fn serve(&self) -> Result<()> {
        let addr = self.config.server.listen_addr()?;
        hub::start_server(self.app_state()?, addr).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, "0.1.0");
    }

    #[test]
    fn test_app_rejects_invalid_config() {
        let mut config = Config::default();
        config.resolver.workers = 0;
        assert!(matches!(App::new(config), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_run_batch_with_static_hosts() {
        let dir = std::env::temp_dir().join(format!("gateway-resolver-app-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let input = dir.join("gateways.txt");
        tokio::fs::write(&input, "# gateways\nvpn2.test\nvpn1.test\n").await.unwrap();

        let mut config = Config::default();
        config.output.input = input;
        config.output.dir = dir.join("out");
        config.output.formats = vec![FormatSelection::Ips, FormatSelection::Json];
        for (host, ip) in [("vpn1.test", "198.51.100.1"), ("vpn2.test", "198.51.100.2")] {
            config.resolver.hosts.insert(host.to_string(), vec![ip.to_string()]);
        }

        let app = App::new(config).unwrap();
        let written = app.run_batch().await.unwrap();
        assert_eq!(written.len(), 2);

        let ips = tokio::fs::read_to_string(dir.join("out").join("ip_list.txt")).await.unwrap();
        assert_eq!(ips, "198.51.100.1\n198.51.100.2");

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
