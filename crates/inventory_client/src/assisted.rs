use std::str::FromStr;
use std::time::Duration;

use mac_address::MacAddress;
use models::{BmcDetails, HostRecord, HostRole, NetworkInterface};
use serde::Deserialize;

use crate::{InventoryClient, RetrievalError};

/// Blocking client for the assisted-install inventory service.
#[derive(Clone)]
pub struct AssistedInventory {
    endpoint: String,
    agent: ureq::Agent,
}

impl std::fmt::Debug for AssistedInventory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistedInventory")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl AssistedInventory {
    /// `timeout` bounds the whole request, which is the only unbounded step of an injection run.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_owned(),
            agent,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn hosts_url(&self, cluster_id: &str) -> String {
        format!(
            "{}/api/assisted-install/v1/clusters/{}/hosts",
            self.endpoint, cluster_id
        )
    }
}

impl InventoryClient for AssistedInventory {
    fn get_hosts(&self, cluster_id: &str) -> Result<Vec<HostRecord>, RetrievalError> {
        let url = self.hosts_url(cluster_id);
        tracing::info!("Fetching inventory hosts from {url}");

        let body = match self.agent.get(&url).call() {
            Ok(response) => {
                response
                    .into_string()
                    .map_err(|source| RetrievalError::Body {
                        url: url.clone(),
                        source,
                    })?
            }
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                return Err(RetrievalError::Http { url, status, body });
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(RetrievalError::Network {
                    url,
                    source: Box::new(transport),
                })
            }
        };

        let hosts = parse_hosts(&url, &body)?;
        tracing::info!("Inventory returned {} discovered host(s)", hosts.len());
        Ok(hosts)
    }
}

#[derive(Debug, Deserialize)]
struct HostJson {
    id: String,
    #[serde(default)]
    requested_hostname: Option<String>,
    #[serde(default)]
    role: Option<String>,
    /// JSON document embedded as a string by the service.
    #[serde(default)]
    inventory: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InventoryJson {
    #[serde(default)]
    hostname: Option<String>,
    #[serde(default)]
    interfaces: Vec<InterfaceJson>,
    #[serde(default)]
    bmc_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InterfaceJson {
    #[serde(default)]
    name: String,
    mac_address: String,
    #[serde(default)]
    ipv4_addresses: Vec<String>,
}

/// Turns the service's host list into records, dropping hosts that have not
/// reported an inventory yet.
pub(crate) fn parse_hosts(url: &str, body: &str) -> Result<Vec<HostRecord>, RetrievalError> {
    let hosts: Vec<HostJson> =
        serde_json::from_str(body).map_err(|source| RetrievalError::Malformed {
            url: url.to_owned(),
            source,
        })?;

    let mut records = Vec::with_capacity(hosts.len());
    for host in hosts {
        match host.inventory.as_deref().map(str::trim) {
            None | Some("") => {
                tracing::warn!("Skipping host {} with no discovered inventory", host.id);
                continue;
            }
            Some(raw) => records.push(host_record(&host, raw)?),
        }
    }

    Ok(records)
}

fn host_record(host: &HostJson, raw_inventory: &str) -> Result<HostRecord, RetrievalError> {
    let malformed = |message: String| RetrievalError::MalformedHost {
        host_id: host.id.clone(),
        message,
    };

    let inventory: InventoryJson = serde_json::from_str(raw_inventory)
        .map_err(|e| malformed(format!("inventory is not valid JSON: {e}")))?;

    if inventory.interfaces.is_empty() {
        return Err(malformed("no network interfaces reported".to_owned()));
    }

    let interfaces = inventory
        .interfaces
        .iter()
        .map(|iface| {
            let mac_address = MacAddress::from_str(&iface.mac_address).map_err(|e| {
                malformed(format!(
                    "invalid MAC `{}` on interface `{}`: {e}",
                    iface.mac_address, iface.name
                ))
            })?;
            Ok(NetworkInterface {
                name: iface.name.clone(),
                mac_address,
                ipv4_addresses: iface.ipv4_addresses.clone(),
            })
        })
        .collect::<Result<Vec<_>, RetrievalError>>()?;

    let hostname = host
        .requested_hostname
        .clone()
        .filter(|h| !h.is_empty())
        .or(inventory.hostname.filter(|h| !h.is_empty()));

    let role = match host.role.as_deref() {
        None | Some("") => None,
        Some(role) => match HostRole::from_str(role) {
            Ok(role) => Some(role),
            Err(_) => {
                tracing::warn!("Ignoring unknown role `{role}` on host {}", host.id);
                None
            }
        },
    };

    let bmc = inventory
        .bmc_address
        .as_deref()
        .filter(|addr| !addr.is_empty() && *addr != "0.0.0.0")
        .map(|addr| BmcDetails {
            address: format!("ipmi://{addr}"),
            credentials_name: format!(
                "{}-bmc-secret",
                hostname.as_deref().unwrap_or(&host.id)
            ),
            disable_certificate_verification: None,
        });

    Ok(HostRecord {
        id: host.id.clone(),
        hostname,
        role,
        interfaces,
        bmc,
    })
}
