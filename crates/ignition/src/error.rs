use std::path::PathBuf;

use inventory_client::RetrievalError;
use strum_macros::Display;
use thiserror::Error;

/// Coarse classification of an [`IgnitionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ErrorKind {
    Retrieval,
    Decode,
    Correlation,
    Encode,
    Persist,
}

#[derive(Debug, Error)]
pub enum IgnitionError {
    #[error("retrieving inventory hosts: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("reading `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("decoding boot document: {message}")]
    DocumentDecode { message: String },

    #[error("decoding file entry {index}: {message}")]
    EntryDecode { index: usize, message: String },

    #[error("decoding manifest `{path}`: {source}")]
    ManifestDecode {
        path: String,
        #[source]
        source: ContentError,
    },

    #[error("{0}")]
    Correlation(#[from] CorrelationError),

    #[error("encoding manifest `{path}`: {source}")]
    ManifestEncode {
        path: String,
        #[source]
        source: ContentError,
    },

    #[error("encoding boot document: {message}")]
    DocumentEncode { message: String },

    #[error("writing `{path}`: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IgnitionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Retrieval(_) => ErrorKind::Retrieval,
            Self::Read { .. }
            | Self::DocumentDecode { .. }
            | Self::EntryDecode { .. }
            | Self::ManifestDecode { .. } => ErrorKind::Decode,
            Self::Correlation(_) => ErrorKind::Correlation,
            Self::ManifestEncode { .. } | Self::DocumentEncode { .. } => ErrorKind::Encode,
            Self::Persist { .. } => ErrorKind::Persist,
        }
    }
}

/// Problems with an entry's embedded payload or the manifest inside it.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("entry has no contents")]
    MissingContents,

    #[error("unsupported contents layout: {0}")]
    UnsupportedLayout(String),

    #[error("contents are fetched from `{url}` and cannot be rewritten locally")]
    RemoteSource { url: String },

    #[error("invalid data url: {0}")]
    InvalidDataUrl(String),

    #[error("unsupported compression `{0}`")]
    UnsupportedCompression(String),

    #[error("entry carries a verification hash that would no longer match")]
    VerificationHash,

    #[error("base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("gzip payload: {0}")]
    Gzip(#[source] std::io::Error),

    #[error("payload is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("not a BareMetalHost manifest: {0}")]
    InvalidManifest(String),
}

#[derive(Debug, Error)]
pub enum CorrelationError {
    #[error("{manifests} BMH manifest(s) but only {hosts} inventory host(s); no host left for `{path}`")]
    TooFewHosts {
        manifests: usize,
        hosts: usize,
        path: String,
    },

    #[error("no inventory host matches manifest `{path}` (looked for `{key}`)")]
    NoMatchingHost { path: String, key: String },

    #[error("manifest `{path}` matches more than one inventory host for `{key}`")]
    AmbiguousHost { path: String, key: String },

    #[error("inventory host `{host}` is claimed by both `{first}` and `{second}`")]
    HostClaimedTwice {
        host: String,
        first: String,
        second: String,
    },

    #[error("inventory host `{host}` has no network interface to boot from")]
    HostWithoutMac { host: String },
}

/// The single failure reported by the injection entry points.
#[derive(Debug, Error)]
#[error("failed to update BMH CRs in bootstrap ignition: {source}")]
pub struct UpdateBmhError {
    #[from]
    source: IgnitionError,
}

impl UpdateBmhError {
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }

    pub fn cause(&self) -> &IgnitionError {
        &self.source
    }

    pub fn into_cause(self) -> IgnitionError {
        self.source
    }
}
