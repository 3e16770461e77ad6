//! JSON documents and the plain IP list

use super::timestamp;
use crate::dns::{ResolutionRecord, ResultSet};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// ARM template expression for the resource group's region
pub const AZURE_LOCATION: &str = "[resourceGroup().location]";

/// Full batch report
#[derive(Debug, Serialize)]
pub struct GatewayReport<'a> {
    pub generated_at: String,
    pub total_gateways: usize,
    pub successful_resolutions: usize,
    pub failed_resolutions: usize,
    pub gateways: &'a [ResolutionRecord],
}

pub fn json_report<'a>(results: &'a ResultSet, generated_at: &DateTime<Utc>) -> GatewayReport<'a> {
    GatewayReport {
        generated_at: timestamp(generated_at),
        total_gateways: results.len(),
        successful_resolutions: results.successful_count(),
        failed_resolutions: results.failed_count(),
        gateways: results.records(),
    }
}

/// Unique addresses, one per line, no trailing newline
pub fn render_ip_list(results: &ResultSet) -> String {
    results.unique_ips().join("\n")
}

/// Azure IP group resource body
#[derive(Debug, Serialize)]
pub struct AzureIpGroup {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub properties: AzureIpGroupProperties,
}

#[derive(Debug, Serialize)]
pub struct AzureIpGroupProperties {
    #[serde(rename = "ipAddresses")]
    pub ip_addresses: Vec<String>,
}

pub fn azure_ip_group(results: &ResultSet, name: &str, location: Option<&str>) -> AzureIpGroup {
    AzureIpGroup {
        name: name.to_string(),
        location: location.map(str::to_string),
        properties: AzureIpGroupProperties {
            ip_addresses: results.unique_ips(),
        },
    }
}
