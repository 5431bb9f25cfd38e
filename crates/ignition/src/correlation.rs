//! Pairs located BMH manifests with inventory hosts.

use std::collections::HashMap;

use models::{CorrelationStrategy, HostRecord};

use crate::error::CorrelationError;

/// What correlation needs to know about one located manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRef {
    /// Target path of the entry embedding the manifest.
    pub path: String,
    /// Host-id annotation or resource name, see [`crate::BmhManifest::correlation_key`].
    pub key: Option<String>,
}

/// Returns one host per manifest, in manifest order.
///
/// Hosts are borrowed from `hosts`; the same input always yields the same pairing.
pub fn correlate<'h>(
    strategy: CorrelationStrategy,
    manifests: &[ManifestRef],
    hosts: &'h [HostRecord],
) -> Result<Vec<&'h HostRecord>, CorrelationError> {
    match strategy {
        CorrelationStrategy::Positional => positional(manifests, hosts),
        CorrelationStrategy::ByName => by_name(manifests, hosts),
    }
}

fn positional<'h>(
    manifests: &[ManifestRef],
    hosts: &'h [HostRecord],
) -> Result<Vec<&'h HostRecord>, CorrelationError> {
    if let Some(unmatched) = manifests.get(hosts.len()) {
        return Err(CorrelationError::TooFewHosts {
            manifests: manifests.len(),
            hosts: hosts.len(),
            path: unmatched.path.clone(),
        });
    }

    Ok(hosts.iter().take(manifests.len()).collect())
}

fn by_name<'h>(
    manifests: &[ManifestRef],
    hosts: &'h [HostRecord],
) -> Result<Vec<&'h HostRecord>, CorrelationError> {
    // host id -> path of the manifest that claimed it
    let mut claimed: HashMap<&str, &str> = HashMap::new();
    let mut pairs = Vec::with_capacity(manifests.len());

    for manifest in manifests {
        let key = manifest.key.as_deref().unwrap_or_default();

        let mut candidates = hosts.iter().filter(|host| !key.is_empty() && host.is_named(key));
        let host = match (candidates.next(), candidates.next()) {
            (Some(host), None) => host,
            (None, _) => {
                return Err(CorrelationError::NoMatchingHost {
                    path: manifest.path.clone(),
                    key: key.to_owned(),
                })
            }
            (Some(_), Some(_)) => {
                return Err(CorrelationError::AmbiguousHost {
                    path: manifest.path.clone(),
                    key: key.to_owned(),
                })
            }
        };

        if let Some(first) = claimed.insert(&host.id, &manifest.path) {
            return Err(CorrelationError::HostClaimedTwice {
                host: host.display_name().to_owned(),
                first: first.to_owned(),
                second: manifest.path.clone(),
            });
        }

        pairs.push(host);
    }

    Ok(pairs)
}
