//! Fetch, decode, correlate, mutate, encode, persist.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use inventory_client::{InventoryClient, InventoryProvider};
use models::{CorrelationStrategy, HostRecord};
use tempfile::NamedTempFile;

use crate::correlation::{correlate, ManifestRef};
use crate::document::BootDocument;
use crate::error::{IgnitionError, UpdateBmhError};
use crate::locator::is_bmh_manifest;
use crate::mutator::{read_manifest, update_manifest};

/// What a successful injection changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectionSummary {
    pub manifests_updated: usize,
    pub entries_total: usize,
}

/// Applies `hosts` to every BMH manifest in `document`.
///
/// Pure: the input document is left as is and the rewritten one returned.
/// Entries that are not BMH manifests come back unchanged and in place.
pub fn inject(
    document: &BootDocument,
    hosts: &[HostRecord],
    strategy: CorrelationStrategy,
) -> Result<BootDocument, IgnitionError> {
    let (document, _) = inject_counted(document, hosts, strategy)?;
    Ok(document)
}

fn inject_counted(
    document: &BootDocument,
    hosts: &[HostRecord],
    strategy: CorrelationStrategy,
) -> Result<(BootDocument, usize), IgnitionError> {
    let mut files = document.files()?;

    let targets: Vec<usize> = files
        .iter()
        .enumerate()
        .filter(|(_, entry)| is_bmh_manifest(entry.path()))
        .map(|(index, _)| index)
        .collect();

    let manifests = targets
        .iter()
        .map(|&index| {
            let entry = &files[index];
            let manifest = read_manifest(entry)?;
            Ok(ManifestRef {
                path: entry.path().to_owned(),
                key: manifest.correlation_key().map(str::to_owned),
            })
        })
        .collect::<Result<Vec<_>, IgnitionError>>()?;

    tracing::debug!(
        "Found {} BMH manifest(s) among {} file entries",
        manifests.len(),
        files.len()
    );

    let paired = correlate(strategy, &manifests, hosts)?;

    for (&index, host) in targets.iter().zip(paired) {
        files[index] = update_manifest(&files[index], host)?;
    }

    Ok((document.with_files(files)?, targets.len()))
}

/// Rewrites the BMH manifests of the ignition file at `path` in place.
///
/// The file is replaced atomically and only once everything else has
/// succeeded; on any error it is left byte-for-byte as it was.
pub fn update_bmh_files<C: InventoryClient>(
    path: &Path,
    cluster_id: &str,
    client: &C,
    strategy: CorrelationStrategy,
) -> Result<InjectionSummary, UpdateBmhError> {
    let summary = update_bmh_files_inner(path, cluster_id, client, strategy)
        .map_err(UpdateBmhError::from)?;

    tracing::info!(
        "Updated {} BMH manifest(s) in {}",
        summary.manifests_updated,
        path.display()
    );
    Ok(summary)
}

fn update_bmh_files_inner<C: InventoryClient>(
    path: &Path,
    cluster_id: &str,
    client: &C,
    strategy: CorrelationStrategy,
) -> Result<InjectionSummary, IgnitionError> {
    let hosts = client.get_hosts(cluster_id)?;
    tracing::debug!("Inventory returned {} host(s) for cluster {cluster_id}", hosts.len());

    let raw = fs::read(path).map_err(|source| IgnitionError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let document = BootDocument::decode(&raw)?;
    tracing::debug!("Decoded {}", path.display());

    let (updated, manifests_updated) = inject_counted(&document, &hosts, strategy)?;
    let entries_total = updated.file_count()?;

    let encoded = updated.encode()?;
    persist_atomically(path, &encoded)?;

    Ok(InjectionSummary {
        manifests_updated,
        entries_total,
    })
}

/// Convenience entry point: stub inventory when `endpoint` is absent,
/// positional correlation.
pub fn inject_hosts(
    path: &Path,
    cluster_id: &str,
    endpoint: Option<&str>,
) -> Result<InjectionSummary, UpdateBmhError> {
    let timeout = Duration::from_secs(inventory_client::DEFAULT_TIMEOUT_SECS);
    let client = InventoryProvider::select(endpoint, timeout);
    update_bmh_files(path, cluster_id, &client, CorrelationStrategy::default())
}

/// Replaces `path` with `bytes` via a sibling temp file and a rename,
/// keeping the original permissions.
fn persist_atomically(path: &Path, bytes: &[u8]) -> Result<(), IgnitionError> {
    let persist_err = |source| IgnitionError::Persist {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let permissions = fs::metadata(path).map_err(persist_err)?.permissions();

    let mut tmp = NamedTempFile::new_in(dir).map_err(persist_err)?;
    tmp.write_all(bytes).map_err(persist_err)?;
    tmp.as_file().sync_all().map_err(persist_err)?;
    tmp.as_file()
        .set_permissions(permissions)
        .map_err(persist_err)?;
    tmp.persist(path).map_err(|e| persist_err(e.error))?;

    tracing::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
