//! Maps generated installation files to object store keys.

use std::fmt;
use std::path::{Path, PathBuf};

use glob::glob;

use crate::error::InstallerError;

/// Object key prefix used when no cluster id is configured.
pub const DUMMY_CLUSTER_ID: &str = "dummy_cluster_id";

const KUBECONFIG: &str = "kubeconfig";
const KUBECONFIG_NOINGRESS: &str = "kubeconfig-noingress";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub local_path: PathBuf,
    pub object_key: String,
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Uploading file {} as object {}",
            self.local_path.display(),
            self.object_key
        )
    }
}

/// Every file under `install_dir`, keyed `<prefix>/<file name>`, sorted by key.
pub fn plan_uploads(install_dir: &Path, prefix: &str) -> Result<Vec<Artifact>, InstallerError> {
    let pattern = format!("{}/**/*", install_dir.display());

    let mut artifacts = Vec::new();
    for entry in glob(&pattern)? {
        let path = entry?;
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            tracing::warn!("Skipping non UTF-8 file name {}", path.display());
            continue;
        };
        let name = if name == KUBECONFIG {
            KUBECONFIG_NOINGRESS
        } else {
            name
        };
        let object_key = format!("{prefix}/{name}");
        artifacts.push(Artifact {
            local_path: path,
            object_key,
        });
    }

    artifacts.sort_by(|a, b| a.object_key.cmp(&b.object_key));
    Ok(artifacts)
}

/// Dry-run upload: logs each artifact.
pub fn log_upload_plan(artifacts: &[Artifact]) {
    for artifact in artifacts {
        tracing::info!("{artifact}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn plan_walks_recursively_and_renames_kubeconfig() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("auth")).unwrap();
        fs::write(dir.path().join("bootstrap.ign"), "{}").unwrap();
        fs::write(dir.path().join("master.ign"), "{}").unwrap();
        fs::write(dir.path().join("auth/kubeconfig"), "").unwrap();
        fs::write(dir.path().join("auth/kubeadmin-password"), "").unwrap();

        let plan = plan_uploads(dir.path(), "c-1").unwrap();
        let keys: Vec<_> = plan.iter().map(|a| a.object_key.as_str()).collect();
        assert_eq!(
            keys,
            [
                "c-1/bootstrap.ign",
                "c-1/kubeadmin-password",
                "c-1/kubeconfig-noingress",
                "c-1/master.ign",
            ]
        );
        assert_eq!(plan[2].local_path, dir.path().join("auth/kubeconfig"));
    }

    #[test]
    fn empty_dir_plans_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(plan_uploads(dir.path(), DUMMY_CLUSTER_ID).unwrap().is_empty());
    }

    #[test]
    fn display() {
        let artifact = Artifact {
            local_path: PathBuf::from("/w/installer_dir/bootstrap.ign"),
            object_key: "dummy_cluster_id/bootstrap.ign".to_owned(),
        };
        assert_eq!(
            artifact.to_string(),
            "Uploading file /w/installer_dir/bootstrap.ign as object dummy_cluster_id/bootstrap.ign"
        );
    }
}
