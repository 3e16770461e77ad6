//! Output rendering
//!
//! Every renderer is a pure function of a [`ResultSet`]; only
//! [`write_outputs`] touches the filesystem.

mod iac;
mod report;

pub use iac::{render_bicep, render_terraform};
pub use report::{azure_ip_group, json_report, render_ip_list, AzureIpGroup, GatewayReport};

use crate::dns::ResultSet;
use crate::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// A single generated document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Json,
    Ips,
    Azure,
    Bicep,
    Terraform,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 5] = [
        OutputFormat::Json,
        OutputFormat::Ips,
        OutputFormat::Azure,
        OutputFormat::Bicep,
        OutputFormat::Terraform,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            OutputFormat::Json => "resolved_gateways.json",
            OutputFormat::Ips => "ip_list.txt",
            OutputFormat::Azure => "azure_ip_group.json",
            OutputFormat::Bicep => "ip_group.bicep",
            OutputFormat::Terraform => "ip_group.tf",
        }
    }
}

/// Format choice as written in config or on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FormatSelection {
    All,
    Json,
    Ips,
    Azure,
    Bicep,
    Terraform,
}

impl FormatSelection {
    /// Concrete formats for a selection list, in canonical order, without repeats
    pub fn expand(selections: &[FormatSelection]) -> Vec<OutputFormat> {
        OutputFormat::ALL
            .into_iter()
            .filter(|format| {
                selections
                    .iter()
                    .any(|s| *s == FormatSelection::All || s.format() == Some(*format))
            })
            .collect()
    }

    fn format(&self) -> Option<OutputFormat> {
        match self {
            FormatSelection::All => None,
            FormatSelection::Json => Some(OutputFormat::Json),
            FormatSelection::Ips => Some(OutputFormat::Ips),
            FormatSelection::Azure => Some(OutputFormat::Azure),
            FormatSelection::Bicep => Some(OutputFormat::Bicep),
            FormatSelection::Terraform => Some(OutputFormat::Terraform),
        }
    }
}

/// Settings shared by the renderers
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub ip_group_name: String,
    pub generated_at: DateTime<Utc>,
}

impl RenderOptions {
    pub fn new(ip_group_name: impl Into<String>) -> Self {
        RenderOptions {
            ip_group_name: ip_group_name.into(),
            generated_at: Utc::now(),
        }
    }

    pub fn with_generated_at(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }
}

/// UTC timestamp with microseconds and an explicit `+00:00` offset
pub fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Render one document
pub fn render(format: OutputFormat, results: &ResultSet, opts: &RenderOptions) -> Result<String> {
    let content = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&json_report(results, &opts.generated_at))?,
        OutputFormat::Ips => render_ip_list(results),
        OutputFormat::Azure => serde_json::to_string_pretty(&azure_ip_group(
            results,
            &opts.ip_group_name,
            Some(report::AZURE_LOCATION),
        ))?,
        OutputFormat::Bicep => render_bicep(results, &opts.ip_group_name, &opts.generated_at),
        OutputFormat::Terraform => render_terraform(results, &opts.ip_group_name, &opts.generated_at),
    };
    Ok(content)
}

/// Write each format into `dir` (created if missing), returning the paths written
pub async fn write_outputs(
    results: &ResultSet,
    formats: &[OutputFormat],
    dir: &Path,
    opts: &RenderOptions,
) -> Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(dir).await?;

    let mut written = Vec::with_capacity(formats.len());
    for format in formats {
        let path = dir.join(format.file_name());
        tokio::fs::write(&path, render(*format, results, opts)?).await?;
        info!("Written: {}", path.display());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::LookupError;
    use crate::dns::ResolutionRecord;
    use chrono::TimeZone;

    fn sample() -> ResultSet {
        ResultSet::new(vec![
            ResolutionRecord::resolved("host1.com", vec!["1.1.1.1".parse().unwrap()]),
            ResolutionRecord::failed("host2.com", &LookupError::NoSuchHost),
        ])
    }

    fn opts() -> RenderOptions {
        RenderOptions::new("vpn-gateways-ip-group")
            .with_generated_at(Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap())
    }

    #[test]
    fn test_expand_all() {
        assert_eq!(FormatSelection::expand(&[FormatSelection::All]), OutputFormat::ALL.to_vec());
    }

    #[test]
    fn test_expand_subset_in_canonical_order() {
        let formats = FormatSelection::expand(&[
            FormatSelection::Terraform,
            FormatSelection::Json,
            FormatSelection::Terraform,
        ]);
        assert_eq!(formats, vec![OutputFormat::Json, OutputFormat::Terraform]);
    }

    #[test]
    fn test_timestamp_format() {
        assert_eq!(timestamp(&opts().generated_at), "2026-10-19T08:30:00.000000+00:00");
    }

    #[test]
    fn test_render_azure_includes_location() {
        let content = render(OutputFormat::Azure, &sample(), &opts()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["name"], "vpn-gateways-ip-group");
        assert_eq!(value["location"], "[resourceGroup().location]");
        assert_eq!(value["properties"]["ipAddresses"], serde_json::json!(["1.1.1.1"]));
    }

    #[tokio::test]
    async fn test_write_outputs() {
        let dir = std::env::temp_dir()
            .join(format!("gateway-resolver-{}", std::process::id()))
            .join("nested");

        let written = write_outputs(&sample(), &OutputFormat::ALL, &dir, &opts())
            .await
            .unwrap();

        assert_eq!(written.len(), 5);
        for format in OutputFormat::ALL {
            assert!(dir.join(format.file_name()).exists());
        }
        let ips = tokio::fs::read_to_string(dir.join("ip_list.txt")).await.unwrap();
        assert_eq!(ips, "1.1.1.1");

        tokio::fs::remove_dir_all(dir.parent().unwrap()).await.unwrap();
    }
}
