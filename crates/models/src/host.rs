use mac_address::MacAddress;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(
    Serialize, Deserialize, Clone, Debug, Hash, Copy, EnumString, Display, Eq, PartialEq,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum HostRole {
    Master,
    Worker,
    AutoAssign,
}

#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct NetworkInterface {
    pub name: String,
    pub mac_address: MacAddress,
    #[serde(default)]
    pub ipv4_addresses: Vec<String>,
}

/// Out-of-band management addressing for a host.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct BmcDetails {
    /// e.g. `ipmi://10.0.0.12` or `redfish-virtualmedia://...`
    pub address: String,
    /// Name of the secret holding the BMC credentials.
    pub credentials_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_certificate_verification: Option<bool>,
}

/// One host of a cluster as reported by the inventory.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct HostRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<HostRole>,
    /// Ordered as discovered; the first interface is the boot interface.
    pub interfaces: Vec<NetworkInterface>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bmc: Option<BmcDetails>,
}

impl HostRecord {
    /// A host with a single interface and nothing else, mostly useful for tests and stubs.
    pub fn with_mac(id: impl Into<String>, mac: MacAddress) -> Self {
        Self {
            id: id.into(),
            hostname: None,
            role: None,
            interfaces: vec![NetworkInterface {
                name: "eth0".to_owned(),
                mac_address: mac,
                ipv4_addresses: Vec::new(),
            }],
            bmc: None,
        }
    }

    pub fn boot_interface(&self) -> Option<&NetworkInterface> {
        self.interfaces.first()
    }

    pub fn boot_mac(&self) -> Option<MacAddress> {
        self.boot_interface().map(|iface| iface.mac_address)
    }

    /// Best human-readable name: hostname if known, otherwise the id.
    pub fn display_name(&self) -> &str {
        self.hostname.as_deref().unwrap_or(&self.id)
    }

    /// Whether `key` names this host, by id or hostname.
    pub fn is_named(&self, key: &str) -> bool {
        self.id == key || self.hostname.as_deref() == Some(key)
    }
}

/// Lowercase, colon separated, the form BMH manifests carry.
pub fn format_mac(mac: &MacAddress) -> String {
    mac.bytes()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}
