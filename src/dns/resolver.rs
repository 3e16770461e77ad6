//! Concurrent batch resolver

use super::lookup::{HickoryLookup, HostsLookup, Lookup, LookupResult, SystemLookup};
use super::record::{ResolutionRecord, ResultSet};
use crate::common::LookupError;
use crate::config::{LookupBackend, ResolverConfig};
use crate::{Error, Result};
use futures::FutureExt;
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Resolves hostnames to [`ResolutionRecord`]s through a [`Lookup`] backend.
///
/// Cheap to clone; clones share the backend.
#[derive(Clone)]
pub struct Resolver {
    lookup: Arc<dyn Lookup>,
    lookup_timeout: Option<Duration>,
}

impl Resolver {
    pub fn new(lookup: Arc<dyn Lookup>) -> Self {
        Resolver {
            lookup,
            lookup_timeout: None,
        }
    }

    /// Bound each individual lookup; an expired lookup becomes a failed record
    pub fn with_lookup_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Build the backend described by `config`
    pub fn from_config(config: &ResolverConfig) -> Result<Self> {
        let upstream: Arc<dyn Lookup> = match config.backend {
            LookupBackend::System => Arc::new(SystemLookup::new()),
            LookupBackend::Hickory => Arc::new(HickoryLookup::new(&config.nameserver_addrs()?)?),
        };

        let hosts = config.host_table()?;
        let lookup: Arc<dyn Lookup> = if hosts.is_empty() {
            upstream
        } else {
            debug!("Loaded {} static host entries", hosts.len());
            Arc::new(HostsLookup::new(hosts).with_upstream(upstream))
        };

        Ok(Resolver::new(lookup).with_lookup_timeout(config.lookup_timeout()))
    }

    /// Resolve one hostname. Never fails: every lookup error, deadline or
    /// backend panic is captured in the record's `error`.
    pub async fn resolve_one(&self, hostname: &str) -> ResolutionRecord {
        let outcome = AssertUnwindSafe(self.lookup_with_deadline(hostname))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(ips)) => {
                debug!("DNS {} -> {:?}", hostname, ips);
                ResolutionRecord::resolved(hostname, ips)
            }
            Ok(Err(e)) => {
                debug!("DNS {} failed: {}", hostname, e);
                ResolutionRecord::failed(hostname, &e)
            }
            Err(payload) => {
                let e = LookupError::Aborted(panic_message(payload.as_ref()));
                warn!("DNS {} failed: {}", hostname, e);
                ResolutionRecord::failed(hostname, &e)
            }
        }
    }

    async fn lookup_with_deadline(&self, hostname: &str) -> LookupResult {
        match self.lookup_timeout {
            Some(limit) => tokio::time::timeout(limit, self.lookup.lookup_ipv4(hostname))
                .await
                .unwrap_or(Err(LookupError::Deadline(limit))),
            None => self.lookup.lookup_ipv4(hostname).await,
        }
    }

    /// Resolve every hostname with at most `max_concurrency` lookups in flight.
    ///
    /// Produces exactly one record per input entry (duplicates included),
    /// sorted by hostname. Fails only when `max_concurrency` is zero.
    pub async fn resolve_all(&self, hostnames: &[String], max_concurrency: usize) -> Result<ResultSet> {
        if max_concurrency == 0 {
            return Err(Error::config("max concurrency must be greater than zero"));
        }
        if hostnames.is_empty() {
            return Ok(ResultSet::default());
        }

        let permits = Arc::new(Semaphore::new(max_concurrency));
        let records = Arc::new(Mutex::new(Vec::with_capacity(hostnames.len())));
        let mut tasks = JoinSet::new();

        for hostname in hostnames {
            // Held by the task until its record is stored
            let permit = permits
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| Error::internal(format!("worker pool closed: {}", e)))?;

            let resolver = self.clone();
            let records = records.clone();
            let hostname = hostname.clone();

            tasks.spawn(async move {
                let record = resolver.resolve_one(&hostname).await;
                records.lock().push(record);
                drop(permit);
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!("Resolution task ended abnormally: {}", e);
            }
        }

        let mut records = std::mem::take(&mut *records.lock());
        if records.len() < hostnames.len() {
            let missing = unaccounted(hostnames, &records);
            records.extend(missing);
        }

        let results = ResultSet::new(records);
        debug!(
            "Resolved {} hostnames: {} successful, {} failed",
            results.len(),
            results.successful_count(),
            results.failed_count()
        );
        Ok(results)
    }
}

/// Failed records for inputs whose task ended without storing a result
fn unaccounted(hostnames: &[String], records: &[ResolutionRecord]) -> Vec<ResolutionRecord> {
    let mut pending: HashMap<&str, usize> = HashMap::new();
    for hostname in hostnames {
        *pending.entry(hostname.as_str()).or_default() += 1;
    }
    for record in records {
        if let Some(count) = pending.get_mut(record.hostname()) {
            *count = count.saturating_sub(1);
        }
    }

    let aborted = LookupError::Aborted("resolution task did not complete".to_string());
    pending
        .into_iter()
        .flat_map(|(hostname, count)| std::iter::repeat(hostname).take(count))
        .map(|hostname| ResolutionRecord::failed(hostname, &aborted))
        .collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "lookup panicked".to_string()
    }
}
