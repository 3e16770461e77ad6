//! Configuration module

use crate::render::FormatSelection;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Lookups in flight per batch unless configured otherwise
pub const DEFAULT_WORKERS: usize = 20;

pub const DEFAULT_URL_TEMPLATE: &str =
    "https://raw.githubusercontent.com/{owner}/{repo}/main/gateways.txt";

pub const DEFAULT_IP_GROUP_NAME: &str = "vpn-gateways-ip-group";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Resolution engine
    pub resolver: ResolverConfig,

    /// Batch tool input/output
    pub output: OutputConfig,

    /// HTTP front-end
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration from file
    pub async fn load_async<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        Self::from_str(&content)
    }

    /// Load from string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.resolver.validate()?;

        if self.output.formats.is_empty() {
            return Err(Error::config("at least one output format is required"));
        }

        self.server.validate()?;
        Ok(())
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: Some("info".to_string()),
            resolver: ResolverConfig::default(),
            output: OutputConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

/// Which name-resolution facility answers lookups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LookupBackend {
    /// Operating system resolver (getaddrinfo)
    #[default]
    System,
    /// Built-in async stub resolver
    Hickory,
}

/// Resolution engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub backend: LookupBackend,

    /// Maximum concurrent lookups
    pub workers: usize,

    /// Per-lookup timeout; unbounded when absent
    #[serde(rename = "lookup-timeout-ms")]
    pub lookup_timeout_ms: Option<u64>,

    /// Upstream nameservers for the hickory backend ("ip" or "ip:port").
    /// Empty uses the system configuration.
    pub nameservers: Vec<String>,

    /// Static answers consulted before the backend
    pub hosts: HashMap<String, Vec<String>>,
}

impl ResolverConfig {
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::config("resolver.workers must be greater than zero"));
        }
        if self.lookup_timeout_ms == Some(0) {
            return Err(Error::config("resolver.lookup-timeout-ms must be greater than zero"));
        }
        self.nameserver_addrs()?;
        self.host_table()?;
        Ok(())
    }

    pub fn lookup_timeout(&self) -> Option<Duration> {
        self.lookup_timeout_ms.map(Duration::from_millis)
    }

    /// Parse nameserver strings; a bare address gets port 53
    pub fn nameserver_addrs(&self) -> Result<Vec<SocketAddr>> {
        self.nameservers
            .iter()
            .map(|ns| {
                if let Ok(ip) = ns.parse::<IpAddr>() {
                    return Ok(SocketAddr::new(ip, 53));
                }
                ns.parse::<SocketAddr>()
                    .map_err(|_| Error::config(format!("invalid nameserver: {}", ns)))
            })
            .collect()
    }

    pub fn host_table(&self) -> Result<HashMap<String, Vec<Ipv4Addr>>> {
        self.hosts
            .iter()
            .map(|(hostname, ips)| {
                let addrs = ips
                    .iter()
                    .map(|ip| {
                        ip.parse::<Ipv4Addr>().map_err(|_| {
                            Error::config(format!("invalid IPv4 address for {}: {}", hostname, ip))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok((hostname.clone(), addrs))
            })
            .collect()
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            backend: LookupBackend::System,
            workers: DEFAULT_WORKERS,
            lookup_timeout_ms: None,
            nameservers: Vec::new(),
            hosts: HashMap::new(),
        }
    }
}

/// Batch tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Gateway list file
    pub input: PathBuf,

    /// Directory for generated files
    pub dir: PathBuf,

    pub formats: Vec<FormatSelection>,

    /// Name of the generated Azure IP group
    #[serde(rename = "ip-group-name")]
    pub ip_group_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            input: PathBuf::from("gateways.txt"),
            dir: PathBuf::from("output"),
            formats: vec![FormatSelection::All],
            ip_group_name: DEFAULT_IP_GROUP_NAME.to_string(),
        }
    }
}

/// HTTP front-end configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub listen: String,

    /// Optional access key
    pub secret: Option<String>,

    /// Default GitHub owner of the gateway list
    pub owner: String,

    /// Default GitHub repository of the gateway list
    pub repo: String,

    /// Raw file URL with `{owner}` and `{repo}` placeholders
    #[serde(rename = "url-template")]
    pub url_template: String,

    #[serde(rename = "fetch-timeout-secs")]
    pub fetch_timeout_secs: u64,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if !self.url_template.contains("{owner}") || !self.url_template.contains("{repo}") {
            return Err(Error::config(
                "server.url-template must contain {owner} and {repo}",
            ));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(Error::config("server.fetch-timeout-secs must be greater than zero"));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen
            .parse()
            .map_err(|_| Error::config(format!("invalid listen address: {}", self.listen)))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            listen: "127.0.0.1:7071".to_string(),
            secret: None,
            owner: "YOUR_GITHUB_USERNAME".to_string(),
            repo: "pugwips".to_string(),
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            fetch_timeout_secs: 30,
        }
    }
}
