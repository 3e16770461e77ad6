//! Name-resolution backends
//!
//! A [`Lookup`] answers one IPv4 query. The resolver never inspects how;
//! backends only report addresses (repeats allowed) or a [`LookupError`].

use crate::common::LookupError;
use crate::{Error, Result};
use async_trait::async_trait;
use dns_lookup::{getaddrinfo, AddrFamily, AddrInfoHints, LookupErrorKind, SockType};
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::TokioAsyncResolver;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub type LookupResult = std::result::Result<Vec<Ipv4Addr>, LookupError>;

/// IPv4 address lookup for a single hostname
#[async_trait]
pub trait Lookup: Send + Sync {
    async fn lookup_ipv4(&self, hostname: &str) -> LookupResult;
}

/// Operating system resolver: `getaddrinfo` restricted to `AF_INET`.
///
/// Names with no IPv4 address (IPv6 literals included) fail.
#[derive(Clone, Debug, Default)]
pub struct SystemLookup;

impl SystemLookup {
    pub fn new() -> Self {
        SystemLookup
    }
}

#[async_trait]
impl Lookup for SystemLookup {
    async fn lookup_ipv4(&self, hostname: &str) -> LookupResult {
        let hints = AddrInfoHints {
            socktype: SockType::Stream.into(),
            address: AddrFamily::Inet.into(),
            ..AddrInfoHints::default()
        };

        let name = hostname.to_owned();
        let addrs = tokio::task::spawn_blocking(move || {
            getaddrinfo(Some(name.as_str()), None, Some(hints))
                .map(|answers| answers.filter_map(|r| r.ok()).map(|r| r.sockaddr).collect::<Vec<_>>())
        })
        .await
        .map_err(|e| LookupError::Aborted(e.to_string()))?
        .map_err(|e| match e.kind() {
            LookupErrorKind::NoName => LookupError::NoSuchHost,
            _ => LookupError::resolver(std::io::Error::from(e).to_string()),
        })?;

        let ips: Vec<Ipv4Addr> = addrs
            .into_iter()
            .filter_map(|addr| match addr.ip() {
                IpAddr::V4(ip) => Some(ip),
                IpAddr::V6(_) => None,
            })
            .collect();

        if ips.is_empty() {
            debug!("getaddrinfo returned no IPv4 address for {}", hostname);
            return Err(LookupError::NoAddress);
        }
        Ok(ips)
    }
}

/// Async stub resolver querying A records directly.
pub struct HickoryLookup {
    resolver: TokioAsyncResolver,
}

impl HickoryLookup {
    /// Build against the given nameservers, or the system configuration if empty.
    /// The resolver's own cache is disabled.
    pub fn new(nameservers: &[SocketAddr]) -> Result<Self> {
        let (config, mut opts) = if nameservers.is_empty() {
            hickory_resolver::system_conf::read_system_conf()
                .map_err(|e| Error::dns(format!("Failed to read system resolver config: {}", e)))?
        } else {
            let mut group = NameServerConfigGroup::new();
            for ns in nameservers {
                group.merge(NameServerConfigGroup::from_ips_clear(&[ns.ip()], ns.port(), true));
            }
            let mut opts = ResolverOpts::default();
            opts.timeout = Duration::from_secs(5);
            opts.attempts = 2;
            opts.rotate = true;
            (ResolverConfig::from_parts(None, vec![], group), opts)
        };

        opts.cache_size = 0;

        Ok(HickoryLookup {
            resolver: TokioAsyncResolver::tokio(config, opts),
        })
    }

    fn classify(hostname: &str, e: ResolveError) -> LookupError {
        debug!("A lookup failed for {}: {}", hostname, e);
        match e.kind() {
            ResolveErrorKind::NoRecordsFound { response_code, .. } => no_records(*response_code),
            ResolveErrorKind::Timeout => LookupError::TimedOut,
            _ => LookupError::resolver(e.to_string()),
        }
    }
}

/// NXDOMAIN means the name is unknown; anything else means it has no A record
fn no_records(response_code: ResponseCode) -> LookupError {
    match response_code {
        ResponseCode::NXDomain => LookupError::NoSuchHost,
        _ => LookupError::NoAddress,
    }
}

#[async_trait]
impl Lookup for HickoryLookup {
    async fn lookup_ipv4(&self, hostname: &str) -> LookupResult {
        // Literal addresses never reach the wire
        if let Ok(ip) = hostname.parse::<Ipv4Addr>() {
            return Ok(vec![ip]);
        }

        let response = self
            .resolver
            .ipv4_lookup(hostname)
            .await
            .map_err(|e| Self::classify(hostname, e))?;

        Ok(response.iter().map(|a| a.0).collect())
    }
}

/// Static hosts table, optionally layered over another backend.
///
/// Names missing from the table go to the upstream backend, or fail with
/// [`LookupError::NoSuchHost`] when there is none.
#[derive(Default)]
pub struct HostsLookup {
    hosts: HashMap<String, Vec<Ipv4Addr>>,
    upstream: Option<Arc<dyn Lookup>>,
}

impl HostsLookup {
    pub fn new(hosts: HashMap<String, Vec<Ipv4Addr>>) -> Self {
        HostsLookup {
            hosts,
            upstream: None,
        }
    }

    pub fn with_upstream(mut self, upstream: Arc<dyn Lookup>) -> Self {
        self.upstream = Some(upstream);
        self
    }

    /// Add or replace an entry
    pub fn insert(&mut self, hostname: impl Into<String>, ips: Vec<Ipv4Addr>) {
        self.hosts.insert(hostname.into(), ips);
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

#[async_trait]
impl Lookup for HostsLookup {
    async fn lookup_ipv4(&self, hostname: &str) -> LookupResult {
        if let Some(ips) = self.hosts.get(hostname) {
            debug!("DNS {} -> {:?} (hosts)", hostname, ips);
            return Ok(ips.clone());
        }

        match self.upstream {
            Some(ref upstream) => upstream.lookup_ipv4(hostname).await,
            None => Err(LookupError::NoSuchHost),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> HashMap<String, Vec<Ipv4Addr>> {
        let mut hosts = HashMap::new();
        hosts.insert(
            "vpn1.example.com".to_string(),
            vec![Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 1)],
        );
        hosts.insert("v6only.example.com".to_string(), Vec::new());
        hosts
    }

    #[tokio::test]
    async fn test_hosts_lookup_hit() {
        let lookup = HostsLookup::new(table());
        let ips = lookup.lookup_ipv4("vpn1.example.com").await.unwrap();
        assert_eq!(ips, vec![Ipv4Addr::new(10, 0, 0, 1); 2]);
    }

    #[tokio::test]
    async fn test_hosts_lookup_empty_entry_is_success() {
        let lookup = HostsLookup::new(table());
        assert_eq!(lookup.lookup_ipv4("v6only.example.com").await, Ok(Vec::new()));
    }

    #[tokio::test]
    async fn test_hosts_lookup_miss_without_upstream() {
        let lookup = HostsLookup::new(table());
        assert_eq!(
            lookup.lookup_ipv4("missing.example.com").await,
            Err(LookupError::NoSuchHost)
        );
    }

    #[tokio::test]
    async fn test_hosts_lookup_falls_through_to_upstream() {
        let mut upstream = HostsLookup::default();
        upstream.insert("vpn2.example.com", vec![Ipv4Addr::new(10, 0, 0, 2)]);

        let lookup = HostsLookup::new(table()).with_upstream(Arc::new(upstream));
        let ips = lookup.lookup_ipv4("vpn2.example.com").await.unwrap();
        assert_eq!(ips, vec![Ipv4Addr::new(10, 0, 0, 2)]);
        assert_eq!(lookup.len(), 2);
    }

    #[tokio::test]
    async fn test_system_lookup_ip_literal() {
        let ips = SystemLookup::new().lookup_ipv4("127.0.0.1").await.unwrap();
        assert_eq!(ips, vec![Ipv4Addr::LOCALHOST]);
    }

    #[tokio::test]
    async fn test_system_lookup_rejects_ipv6_literal() {
        let result = SystemLookup::new().lookup_ipv4("::1").await;
        assert!(result.is_err(), "expected failure, got {:?}", result);
    }

    #[tokio::test]
    async fn test_system_lookup_ipv6_literal_is_failed_record() {
        let resolver = crate::dns::Resolver::new(Arc::new(SystemLookup::new()));
        let record = resolver.resolve_one("::1").await;
        assert!(record.ips().is_empty());
        assert!(record.is_failure());
    }

    #[test]
    fn test_no_records_classification() {
        assert_eq!(no_records(ResponseCode::NXDomain), LookupError::NoSuchHost);
        assert_eq!(no_records(ResponseCode::NoError), LookupError::NoAddress);
    }

    #[test]
    fn test_classify_timeout() {
        let e = ResolveError::from(ResolveErrorKind::Timeout);
        assert_eq!(HickoryLookup::classify("vpn.example.com", e), LookupError::TimedOut);
    }

    #[tokio::test]
    async fn test_hickory_lookup_ip_literal() {
        let lookup = HickoryLookup::new(&["127.0.0.1:53".parse().unwrap()]).unwrap();
        let ips = lookup.lookup_ipv4("192.0.2.7").await.unwrap();
        assert_eq!(ips, vec![Ipv4Addr::new(192, 0, 2, 7)]);
    }
}
