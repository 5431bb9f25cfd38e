use mac_address::MacAddress;
use models::{HostRecord, HostRole, NetworkInterface};
use uuid::Uuid;

use crate::{InventoryClient, RetrievalError};

const STUB_ROLES: [(HostRole, &str); 5] = [
    (HostRole::Master, "master-0"),
    (HostRole::Master, "master-1"),
    (HostRole::Master, "master-2"),
    (HostRole::Worker, "worker-0"),
    (HostRole::Worker, "worker-1"),
];

/// Fixed host list used when no inventory endpoint is configured.
///
/// Records depend only on the cluster id, so repeated runs always correlate
/// the same way.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubInventory;

impl StubInventory {
    pub fn hosts(cluster_id: &str) -> Vec<HostRecord> {
        STUB_ROLES
            .iter()
            .enumerate()
            .map(|(index, (role, hostname))| {
                let id = Uuid::new_v5(
                    &Uuid::NAMESPACE_URL,
                    format!("{cluster_id}/{index}").as_bytes(),
                );
                HostRecord {
                    id: id.to_string(),
                    hostname: Some((*hostname).to_owned()),
                    role: Some(*role),
                    interfaces: vec![NetworkInterface {
                        name: "ens3".to_owned(),
                        mac_address: MacAddress::new([0x52, 0x54, 0x00, 0x00, 0x00, index as u8]),
                        ipv4_addresses: vec![format!("192.168.126.{}/24", 10 + index)],
                    }],
                    bmc: None,
                }
            })
            .collect()
    }
}

impl InventoryClient for StubInventory {
    fn get_hosts(&self, cluster_id: &str) -> Result<Vec<HostRecord>, RetrievalError> {
        tracing::info!("Using test data to get hosts list");
        Ok(Self::hosts(cluster_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::format_mac;

    #[test]
    fn stub_is_deterministic_per_cluster() {
        let a = StubInventory.get_hosts("cluster-a").unwrap();
        assert_eq!(a, StubInventory.get_hosts("cluster-a").unwrap());

        let b = StubInventory.get_hosts("cluster-b").unwrap();
        assert_ne!(a[0].id, b[0].id);
        // only the ids depend on the cluster
        assert_eq!(a[0].boot_mac(), b[0].boot_mac());
    }

    #[test]
    fn stub_layout() {
        let hosts = StubInventory::hosts("c");
        assert_eq!(hosts.len(), 5);
        assert_eq!(
            hosts
                .iter()
                .filter(|h| h.role == Some(HostRole::Master))
                .count(),
            3
        );
        assert_eq!(hosts[3].hostname.as_deref(), Some("worker-0"));
        let macs: Vec<_> = hosts
            .iter()
            .filter_map(|h| h.boot_mac())
            .map(|m| format_mac(&m))
            .collect();
        assert_eq!(macs[0], "52:54:00:00:00:00");
        assert_eq!(macs[4], "52:54:00:00:00:04");
        assert!(hosts.iter().all(|h| h.bmc.is_none()));
    }
}
