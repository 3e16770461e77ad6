//! Resolution records and batch result sets

use crate::common::LookupError;
use serde::Serialize;
use std::collections::BTreeSet;
use std::net::Ipv4Addr;

/// Outcome of resolving one hostname.
///
/// `error` is set only when the lookup failed, in which case `ips` is empty.
/// A lookup that succeeded with no addresses has both empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolutionRecord {
    hostname: String,
    ips: Vec<String>,
    error: Option<String>,
}

impl ResolutionRecord {
    /// Build a successful record from raw addresses (deduplicated and sorted as text)
    pub fn resolved<I>(hostname: impl Into<String>, addrs: I) -> Self
    where
        I: IntoIterator<Item = Ipv4Addr>,
    {
        let ips: BTreeSet<String> = addrs.into_iter().map(|ip| ip.to_string()).collect();
        ResolutionRecord {
            hostname: hostname.into(),
            ips: ips.into_iter().collect(),
            error: None,
        }
    }

    /// Build a failed record
    pub fn failed(hostname: impl Into<String>, error: &LookupError) -> Self {
        ResolutionRecord {
            hostname: hostname.into(),
            ips: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn ips(&self) -> &[String] {
        &self.ips
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Lookup produced at least one address
    pub fn is_success(&self) -> bool {
        !self.ips.is_empty()
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Records of one batch, sorted by hostname.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResultSet {
    records: Vec<ResolutionRecord>,
}

impl ResultSet {
    /// Sorts the records by hostname. Order among equal hostnames is unspecified.
    pub fn new(mut records: Vec<ResolutionRecord>) -> Self {
        records.sort_by(|a, b| a.hostname.cmp(&b.hostname));
        ResultSet { records }
    }

    pub fn records(&self) -> &[ResolutionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResolutionRecord> {
        self.records.iter()
    }

    /// Union of every record's addresses, sorted
    pub fn unique_ips(&self) -> Vec<String> {
        self.records
            .iter()
            .flat_map(|r| r.ips.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn successful_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_failure()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ResolutionRecord> {
        self.records.iter().filter(|r| r.is_failure())
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a ResolutionRecord;
    type IntoIter = std::slice::Iter<'a, ResolutionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> Ipv4Addr {
        s.parse().unwrap()
    }

    #[test]
    fn test_resolved_dedupes_and_sorts_as_text() {
        let record = ResolutionRecord::resolved(
            "x.test",
            vec![ip("9.9.9.9"), ip("10.0.0.1"), ip("9.9.9.9"), ip("1.1.1.1")],
        );
        assert_eq!(record.ips(), &["1.1.1.1", "10.0.0.1", "9.9.9.9"]);
        assert!(record.error().is_none());
        assert!(record.is_success());
    }

    #[test]
    fn test_failed_record() {
        let record = ResolutionRecord::failed("b.test", &LookupError::NoSuchHost);
        assert_eq!(record.hostname(), "b.test");
        assert!(record.ips().is_empty());
        assert_eq!(record.error(), Some("no such host"));
        assert!(record.is_failure());
        assert!(!record.is_success());
    }

    #[test]
    fn test_empty_success_is_neither() {
        let record = ResolutionRecord::resolved("empty.test", Vec::new());
        assert!(!record.is_success());
        assert!(!record.is_failure());
    }

    #[test]
    fn test_result_set_aggregates() {
        let set = ResultSet::new(vec![
            ResolutionRecord::resolved("c.test", vec![ip("3.3.3.3"), ip("1.1.1.1")]),
            ResolutionRecord::failed("b.test", &LookupError::TimedOut),
            ResolutionRecord::resolved("a.test", vec![ip("1.1.1.1")]),
            ResolutionRecord::resolved("d.test", Vec::new()),
        ]);

        let names: Vec<_> = set.iter().map(|r| r.hostname()).collect();
        assert_eq!(names, ["a.test", "b.test", "c.test", "d.test"]);
        assert_eq!(set.unique_ips(), ["1.1.1.1", "3.3.3.3"]);
        assert_eq!(set.successful_count(), 2);
        assert_eq!(set.failed_count(), 1);
        assert!(set.successful_count() + set.failed_count() < set.len());
        assert_eq!(set.failures().count(), 1);
    }

    #[test]
    fn test_record_json_shape() {
        let set = ResultSet::new(vec![
            ResolutionRecord::failed("b.test", &LookupError::NoSuchHost),
            ResolutionRecord::resolved("a.test", vec![ip("9.9.9.9")]),
        ]);
        let value = serde_json::to_value(&set).unwrap();
        assert_eq!(
            value,
            serde_json::json!([
                {"hostname": "a.test", "ips": ["9.9.9.9"], "error": null},
                {"hostname": "b.test", "ips": [], "error": "no such host"}
            ])
        );
    }
}
