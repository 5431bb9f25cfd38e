use std::path::PathBuf;

use ignition::UpdateBmhError;
use installer::InstallerError;
use inventory_client::RetrievalError;
use settings::SettingsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Installer(#[from] InstallerError),

    #[error(transparent)]
    UpdateBmh(#[from] UpdateBmhError),

    #[error("retrieving inventory hosts: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("encoding host list: {0}")]
    Json(#[from] serde_json::Error),

    #[error("opening log file `{path}`: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("couldn't set up tracing: {0}")]
    Tracing(#[from] tracing::subscriber::SetGlobalDefaultError),
}
