//! Shared vocabulary for the BMH injection tooling: inventory host records and
//! the strategies used to pair them with embedded manifests.

pub mod correlation;
pub mod host;

pub use correlation::CorrelationStrategy;
pub use host::{format_mac, BmcDetails, HostRecord, HostRole, NetworkInterface};
pub use mac_address::MacAddress;
