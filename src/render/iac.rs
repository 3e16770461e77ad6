//! Infrastructure-as-code templates for an Azure IP group

use super::timestamp;
use crate::dns::ResultSet;
use chrono::{DateTime, Utc};

/// Bicep module declaring a `Microsoft.Network/ipGroups` resource
pub fn render_bicep(results: &ResultSet, ip_group_name: &str, generated_at: &DateTime<Utc>) -> String {
    let ips = results.unique_ips();
    let ip_array = ips
        .iter()
        .map(|ip| format!("    '{}'", ip))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"// Auto-generated VPN Gateway IP Group
// Generated at: {generated}
// Total IPs: {count}

param location string = resourceGroup().location
param ipGroupName string = '{name}'

resource ipGroup 'Microsoft.Network/ipGroups@2023-05-01' = {{
  name: ipGroupName
  location: location
  properties: {{
    ipAddresses: [
{ip_array}
    ]
  }}
}}

output ipGroupId string = ipGroup.id
"#,
        generated = timestamp(generated_at),
        count = ips.len(),
        name = ip_group_name,
        ip_array = ip_array,
    )
}

/// Terraform configuration declaring an `azurerm_ip_group`
pub fn render_terraform(results: &ResultSet, ip_group_name: &str, generated_at: &DateTime<Utc>) -> String {
    let ips = results.unique_ips();
    let ip_list = ips
        .iter()
        .map(|ip| format!("\"{}\"", ip))
        .collect::<Vec<_>>()
        .join(",\n    ");

    format!(
        r#"# Auto-generated VPN Gateway IP Group
# Generated at: {generated}
# Total IPs: {count}

variable "resource_group_name" {{
  description = "The name of the resource group"
  type        = string
}}

variable "location" {{
  description = "The Azure region"
  type        = string
}}

resource "azurerm_ip_group" "vpn_gateways" {{
  name                = "{name}"
  location            = var.location
  resource_group_name = var.resource_group_name

  cidrs = [
    {ip_list}
  ]
}}

output "ip_group_id" {{
  value = azurerm_ip_group.vpn_gateways.id
}}
"#,
        generated = timestamp(generated_at),
        count = ips.len(),
        name = ip_group_name,
        ip_list = ip_list,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::ResolutionRecord;
    use chrono::TimeZone;

    fn results() -> ResultSet {
        ResultSet::new(vec![
            ResolutionRecord::resolved("a.example.com", vec!["2.2.2.2".parse().unwrap()]),
            ResolutionRecord::resolved("b.example.com", vec!["1.1.1.1".parse().unwrap()]),
        ])
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_bicep() {
        let bicep = render_bicep(&results(), "vpn-gateways-ip-group", &at());

        assert!(bicep.starts_with("// Auto-generated VPN Gateway IP Group\n"));
        assert!(bicep.contains("// Generated at: 2026-10-19T00:00:00.000000+00:00\n"));
        assert!(bicep.contains("// Total IPs: 2\n"));
        assert!(bicep.contains("param ipGroupName string = 'vpn-gateways-ip-group'\n"));
        assert!(bicep.contains("resource ipGroup 'Microsoft.Network/ipGroups@2023-05-01' = {\n"));
        assert!(bicep.contains("    ipAddresses: [\n    '1.1.1.1'\n    '2.2.2.2'\n    ]\n"));
        assert!(bicep.ends_with("output ipGroupId string = ipGroup.id\n"));
    }

    #[test]
    fn test_terraform() {
        let tf = render_terraform(&results(), "corp-vpn", &at());

        assert!(tf.starts_with("# Auto-generated VPN Gateway IP Group\n"));
        assert!(tf.contains("# Total IPs: 2\n"));
        assert!(tf.contains("resource \"azurerm_ip_group\" \"vpn_gateways\" {\n"));
        assert!(tf.contains("  name                = \"corp-vpn\"\n"));
        assert!(tf.contains("  cidrs = [\n    \"1.1.1.1\",\n    \"2.2.2.2\"\n  ]\n"));
        assert!(tf.ends_with("output \"ip_group_id\" {\n  value = azurerm_ip_group.vpn_gateways.id\n}\n"));
    }

    #[test]
    fn test_terraform_no_ips() {
        let tf = render_terraform(&ResultSet::default(), "corp-vpn", &at());
        assert!(tf.contains("# Total IPs: 0\n"));
        assert!(tf.contains("  cidrs = [\n    \n  ]\n"));
    }
}
