//! Installer working directory and its `install-config.yaml`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::InstallerError;

pub const CONFIG_DIR_NAME: &str = "installer_dir";
pub const INSTALL_CONFIG: &str = "install-config.yaml";
pub const INSTALL_CONFIG_BACKUP: &str = "backup-install-config.yaml";

/// Creates `<work_dir>/installer_dir` if needed and returns it.
pub fn create_config_dir(work_dir: &Path) -> Result<PathBuf, InstallerError> {
    let config_dir = work_dir.join(CONFIG_DIR_NAME);
    fs::create_dir_all(&config_dir).map_err(InstallerError::io(&config_dir))?;
    tracing::debug!("Installer directory is {}", config_dir.display());
    Ok(config_dir)
}

/// Makes sure `install-config.yaml` exists in `config_dir`.
///
/// An existing file wins over `install_config`.
pub fn prepare_install_config(
    config_dir: &Path,
    install_config: Option<&str>,
) -> Result<PathBuf, InstallerError> {
    let path = config_dir.join(INSTALL_CONFIG);
    if path.exists() {
        tracing::info!("{} already exists, leaving it in place", path.display());
        return Ok(path);
    }

    let Some(text) = install_config else {
        return Err(InstallerError::MissingInstallConfig(config_dir.to_path_buf()));
    };

    fs::write(&path, text).map_err(InstallerError::io(&path))?;
    tracing::info!("Wrote {}", path.display());
    Ok(path)
}

/// Keeps a copy of `install-config.yaml` for as long as it lives and puts it
/// back on drop. The installer consumes the original.
#[derive(Debug)]
pub struct InstallConfigBackup {
    original: PathBuf,
    backup: PathBuf,
}

impl InstallConfigBackup {
    pub fn acquire(config_dir: &Path) -> Result<Self, InstallerError> {
        let original = config_dir.join(INSTALL_CONFIG);
        let backup = config_dir.join(INSTALL_CONFIG_BACKUP);
        fs::copy(&original, &backup).map_err(InstallerError::io(&original))?;
        tracing::debug!("Backed up {} to {}", original.display(), backup.display());
        Ok(Self { original, backup })
    }
}

impl Drop for InstallConfigBackup {
    fn drop(&mut self) {
        if let Err(e) = fs::rename(&self.backup, &self.original) {
            tracing::error!(
                "Failed to restore {} from {}: {e}",
                self.original.display(),
                self.backup.display()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn config_dir_is_created_once() {
        let work = tempfile::tempdir().unwrap();
        let first = create_config_dir(work.path()).unwrap();
        let second = create_config_dir(work.path()).unwrap();
        assert_eq!(first, work.path().join("installer_dir"));
        assert_eq!(first, second);
        assert!(first.is_dir());
    }

    #[test]
    fn install_config_is_written_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = prepare_install_config(dir.path(), Some("apiVersion: v1\n")).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "apiVersion: v1\n");
    }

    #[test]
    fn existing_install_config_wins() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(INSTALL_CONFIG), "existing").unwrap();
        prepare_install_config(dir.path(), Some("new")).unwrap();
        prepare_install_config(dir.path(), None).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join(INSTALL_CONFIG)).unwrap(),
            "existing"
        );
    }

    #[test]
    fn missing_install_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = prepare_install_config(dir.path(), None).unwrap_err();
        assert!(matches!(err, InstallerError::MissingInstallConfig(_)), "{err}");
    }

    #[test]
    fn backup_restores_consumed_config() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join(INSTALL_CONFIG);
        fs::write(&original, "cfg").unwrap();

        {
            let _backup = InstallConfigBackup::acquire(dir.path()).unwrap();
            fs::remove_file(&original).unwrap();
        }

        assert_eq!(fs::read_to_string(&original).unwrap(), "cfg");
        assert!(!dir.path().join(INSTALL_CONFIG_BACKUP).exists());
    }

    #[test]
    fn backup_needs_an_original() {
        let dir = tempfile::tempdir().unwrap();
        assert!(InstallConfigBackup::acquire(dir.path()).is_err());
    }
}
