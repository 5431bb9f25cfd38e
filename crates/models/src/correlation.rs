use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// How embedded BMH manifests are paired with inventory hosts.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, Hash, EnumString, Display, Eq, PartialEq, Default,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CorrelationStrategy {
    /// The n-th manifest in document order gets the n-th inventory host.
    #[default]
    Positional,
    /// Each manifest is matched to the host whose id or hostname equals the
    /// manifest's host-id annotation, or failing that its resource name.
    ByName,
}
