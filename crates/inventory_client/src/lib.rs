//! Host inventory retrieval.
//!
//! The [`InventoryClient`] trait is the seam between the injection core and
//! wherever host records come from. [`InventoryProvider`] picks the live
//! assisted-install service when an endpoint is configured and the
//! deterministic [`StubInventory`] otherwise.

use std::time::Duration;

use enum_dispatch::enum_dispatch;
use models::HostRecord;

mod assisted;
mod error;
mod stub;

pub use assisted::AssistedInventory;
pub use error::RetrievalError;
pub use stub::StubInventory;

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Source of the ordered host list for a cluster.
#[enum_dispatch]
pub trait InventoryClient {
    /// Returns the cluster's hosts in inventory order.
    ///
    /// # Errors
    ///
    /// Returns a [`RetrievalError`] if the inventory cannot be reached or its
    /// response cannot be turned into host records.
    fn get_hosts(&self, cluster_id: &str) -> Result<Vec<HostRecord>, RetrievalError>;
}

#[derive(Debug, Clone)]
#[enum_dispatch(InventoryClient)]
pub enum InventoryProvider {
    Assisted(AssistedInventory),
    Stub(StubInventory),
}

impl InventoryProvider {
    /// Live client for `endpoint` if one is given (and non-empty), stub otherwise.
    pub fn select(endpoint: Option<&str>, timeout: Duration) -> Self {
        match endpoint.map(str::trim).filter(|e| !e.is_empty()) {
            Some(endpoint) => AssistedInventory::new(endpoint, timeout).into(),
            None => StubInventory.into(),
        }
    }

    pub fn is_stub(&self) -> bool {
        matches!(self, Self::Stub(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_provider() {
        let timeout = Duration::from_secs(1);
        assert!(InventoryProvider::select(None, timeout).is_stub());
        assert!(InventoryProvider::select(Some("  "), timeout).is_stub());
        assert!(!InventoryProvider::select(Some("http://inv:8090"), timeout).is_stub());
    }

    #[test]
    fn provider_dispatches_to_stub() {
        let provider = InventoryProvider::select(None, Duration::from_secs(1));
        let hosts = provider.get_hosts("cluster-a").unwrap();
        assert_eq!(hosts, StubInventory.get_hosts("cluster-a").unwrap());
    }
}
