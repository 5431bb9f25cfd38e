//! Injects inventory host details into the BareMetalHost manifests embedded in
//! an OpenShift bootstrap ignition file.
//!
//! The usual entry point is [`update_bmh_files`] (or [`inject_hosts`], which
//! picks the inventory client from an optional endpoint). [`inject`] is the
//! pure document-to-document transform underneath.

pub mod contents;
pub mod correlation;
pub mod document;
pub mod error;
pub mod locator;
pub mod manifest;
pub mod mutator;
pub mod orchestrator;

pub use contents::{Compression, DataUrl, FileContents, PayloadEncoding};
pub use correlation::{correlate, ManifestRef};
pub use document::{BootDocument, FileEntry};
pub use error::{ContentError, CorrelationError, ErrorKind, IgnitionError, UpdateBmhError};
pub use locator::is_bmh_manifest;
pub use manifest::{BmhManifest, HOST_ID_ANNOTATION};
pub use models::CorrelationStrategy;
pub use mutator::{read_manifest, update_manifest};
pub use orchestrator::{inject, inject_hosts, update_bmh_files, InjectionSummary};

pub mod prelude {
    pub use crate::{
        inject, inject_hosts, update_bmh_files, BootDocument, CorrelationStrategy, ErrorKind,
        InjectionSummary, UpdateBmhError,
    };
    pub use inventory_client::{InventoryClient, InventoryProvider};
}
