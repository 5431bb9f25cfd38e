//! Recognizes the file entries that embed BareMetalHost custom resources.

/// Directory the installer writes cluster manifests to inside the bootstrap ignition.
pub const MANIFEST_DIR: &str = "/opt/openshift/openshift/";

/// File name prefix of the installer's BareMetalHost manifests.
///
/// The BMC secrets (`99_openshift-cluster-api_host-bmc-secrets-N.yaml`) and
/// machine manifests live in the same directory and must not match.
pub const BMH_FILE_PREFIX: &str = "99_openshift-cluster-api_hosts-";

const BMH_FILE_SUFFIX: &str = ".yaml";

/// Whether the entry at `path` holds a BMH manifest.
pub fn is_bmh_manifest(path: &str) -> bool {
    let Some(file_name) = path.strip_prefix(MANIFEST_DIR) else {
        return false;
    };

    file_name
        .strip_prefix(BMH_FILE_PREFIX)
        .and_then(|rest| rest.strip_suffix(BMH_FILE_SUFFIX))
        .is_some_and(|index| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()))
}
