//! Wrappers around the OpenShift installer: working directory, install config
//! backup, ignition generation and the artifact upload plan.

mod artifacts;
mod config_dir;
mod error;
mod generate;

pub use artifacts::{log_upload_plan, plan_uploads, Artifact, DUMMY_CLUSTER_ID};
pub use config_dir::{
    create_config_dir, prepare_install_config, InstallConfigBackup, CONFIG_DIR_NAME,
    INSTALL_CONFIG, INSTALL_CONFIG_BACKUP,
};
pub use error::InstallerError;
pub use generate::{generate_installation_files, INSTALLER_BINARY};
