//! Rewrites the hardware and network fields of one embedded BMH manifest.

use models::{format_mac, HostRecord};

use crate::document::FileEntry;
use crate::error::{CorrelationError, IgnitionError};
use crate::manifest::{
    edit_mapping, set_field, BmhManifest, BMC, BMC_ADDRESS, BMC_CREDENTIALS_NAME,
    BMC_DISABLE_CERT_VERIFICATION, BOOT_MAC_ADDRESS, ONLINE,
};

/// Decodes the manifest embedded in `entry`.
pub fn read_manifest(entry: &FileEntry) -> Result<BmhManifest, IgnitionError> {
    let decode_err = |source| IgnitionError::ManifestDecode {
        path: entry.path().to_owned(),
        source,
    };

    let text = entry
        .contents()
        .and_then(|contents| contents.decode_text())
        .map_err(decode_err)?;
    BmhManifest::parse(&text).map_err(decode_err)
}

/// Applies `host` to the manifest embedded in `entry`.
///
/// Returns a new entry that differs from `entry` only in its payload, which is
/// re-embedded with the envelope (encoding, media type and compression) it
/// was read with.
pub fn update_manifest(entry: &FileEntry, host: &HostRecord) -> Result<FileEntry, IgnitionError> {
    let path = entry.path();
    let contents = entry
        .contents()
        .map_err(|source| IgnitionError::ManifestDecode {
            path: path.to_owned(),
            source,
        })?;

    let mut manifest = read_manifest(entry)?;
    apply_host(&mut manifest, host)?;

    let encode_err = |source| IgnitionError::ManifestEncode {
        path: path.to_owned(),
        source,
    };
    let yaml = manifest.to_yaml().map_err(encode_err)?;
    let contents = contents.reencode(yaml.as_bytes()).map_err(encode_err)?;

    tracing::debug!(
        "Updated {} ({}) with host {} boot MAC {}",
        path,
        manifest.name().unwrap_or("<unnamed>"),
        host.display_name(),
        manifest.boot_mac_address().unwrap_or_default(),
    );

    entry.with_contents(&contents).map_err(encode_err)
}

/// Overwrites the designated spec fields from `host`, leaving everything else alone.
pub(crate) fn apply_host(
    manifest: &mut BmhManifest,
    host: &HostRecord,
) -> Result<(), CorrelationError> {
    let mac = host.boot_mac().ok_or_else(|| CorrelationError::HostWithoutMac {
        host: host.display_name().to_owned(),
    })?;

    manifest.edit_spec(|spec| {
        set_field(spec, BOOT_MAC_ADDRESS, format_mac(&mac));
        set_field(spec, ONLINE, true);

        if let Some(bmc_details) = &host.bmc {
            edit_mapping(spec, BMC, |bmc| {
                set_field(bmc, BMC_ADDRESS, bmc_details.address.as_str());
                set_field(bmc, BMC_CREDENTIALS_NAME, bmc_details.credentials_name.as_str());
                if let Some(disable) = bmc_details.disable_certificate_verification {
                    set_field(bmc, BMC_DISABLE_CERT_VERIFICATION, disable);
                }
            });
        }
    });

    Ok(())
}
