//! Drives `openshift-install` to produce the ignition configs.

use std::path::Path;
use std::process::Command;

use crate::config_dir::InstallConfigBackup;
use crate::error::InstallerError;

pub const INSTALLER_BINARY: &str = "openshift-install";
pub const INVOKER_ENV: &str = "OPENSHIFT_INSTALL_INVOKER";
pub const INVOKER: &str = "assisted-installer";

/// Runs `<work_dir>/openshift-install create ignition-configs --dir <config_dir>`.
///
/// `install-config.yaml` is restored afterwards whether or not the installer succeeded.
pub fn generate_installation_files(work_dir: &Path, config_dir: &Path) -> Result<(), InstallerError> {
    let _backup = InstallConfigBackup::acquire(config_dir)?;

    let binary = work_dir.join(INSTALLER_BINARY);
    tracing::info!("Running {} in {}", binary.display(), config_dir.display());

    let output = Command::new(&binary)
        .args(["create", "ignition-configs", "--dir"])
        .arg(config_dir)
        .env(INVOKER_ENV, INVOKER)
        .output()
        .map_err(|e| InstallerError::Generate {
            message: format!("could not run {}: {e}", binary.display()),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::error!("{} exited with {}", binary.display(), output.status);
        return Err(InstallerError::Generate {
            message: format!("{} exited with {}: {}", binary.display(), output.status, stderr.trim()),
        });
    }

    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config_dir::{INSTALL_CONFIG, INSTALL_CONFIG_BACKUP};
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    /// Puts a fake installer script into `work_dir`.
    fn fake_installer(work_dir: &Path, body: &str) {
        let path = work_dir.join(INSTALLER_BINARY);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn setup() -> (tempfile::TempDir, std::path::PathBuf) {
        let work = tempfile::tempdir().unwrap();
        let config_dir = work.path().join("installer_dir");
        fs::create_dir(&config_dir).unwrap();
        fs::write(config_dir.join(INSTALL_CONFIG), "cfg").unwrap();
        (work, config_dir)
    }

    #[test]
    fn installer_output_and_config_restored() {
        let (work, config_dir) = setup();
        // consumes install-config.yaml the way the real installer does
        fake_installer(
            work.path(),
            r#"rm "$4/install-config.yaml"; echo "$1 $2 $OPENSHIFT_INSTALL_INVOKER" > "$4/bootstrap.ign""#,
        );

        generate_installation_files(work.path(), &config_dir).unwrap();

        assert_eq!(
            fs::read_to_string(config_dir.join("bootstrap.ign")).unwrap(),
            "create ignition-configs assisted-installer\n"
        );
        assert_eq!(fs::read_to_string(config_dir.join(INSTALL_CONFIG)).unwrap(), "cfg");
        assert!(!config_dir.join(INSTALL_CONFIG_BACKUP).exists());
    }

    #[test]
    fn failing_installer_reports_stderr_and_restores_config() {
        let (work, config_dir) = setup();
        fake_installer(
            work.path(),
            r#"rm "$4/install-config.yaml"; echo "bad platform" >&2; exit 3"#,
        );

        let err = generate_installation_files(work.path(), &config_dir).unwrap_err();

        assert!(err.to_string().contains("bad platform"), "{err}");
        assert_eq!(fs::read_to_string(config_dir.join(INSTALL_CONFIG)).unwrap(), "cfg");
    }

    #[test]
    fn missing_installer_is_a_generate_error() {
        let (work, config_dir) = setup();
        let err = generate_installation_files(work.path(), &config_dir).unwrap_err();
        assert!(matches!(err, InstallerError::Generate { .. }), "{err}");
        assert!(config_dir.join(INSTALL_CONFIG).exists());
    }
}
