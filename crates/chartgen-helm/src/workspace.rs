//! Per-call temporary directory
//!
//! A [`Workspace`] is acquired at the start of a generation call and
//! removed when dropped, whichever way the call ends.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

use crate::error::{HelmError, Result};

const WORKSPACE_PREFIX: &str = "kustomize-helm-";

/// Suffix of the values file written for helm
pub const VALUES_FILE_SUFFIX: &str = "-kustomize-values.yaml";

#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh temporary directory to serve as helm's config home
    pub fn new() -> Result<Self> {
        Self::for_chart(None)
    }

    /// Create the workspace for one chart
    ///
    /// With a configured config home the workspace only holds the values
    /// file, and a failure is reported as such.
    pub fn for_chart(config_home: Option<&Path>) -> Result<Self> {
        Self::create(None, creation_context(config_home))
    }

    fn create(parent: Option<&Path>, context: &str) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);
        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
        .map_err(|e| HelmError::io(format!("{}: {}", context, e)))?;

        debug!(path = %dir.path().display(), "created workspace");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// The configured helm config home, or `helm/` inside the workspace
    pub fn config_home(&self, configured: Option<&Path>) -> PathBuf {
        configured
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.path().join("helm"))
    }

    /// Path of the values file for `chart_name`
    pub fn values_path(&self, chart_name: &str) -> PathBuf {
        self.path()
            .join(format!("{}{}", chart_name, VALUES_FILE_SUFFIX))
    }

    /// Write the values file for `chart_name`, returning its path
    pub fn write_values(&self, chart_name: &str, content: &[u8]) -> Result<PathBuf> {
        let path = self.values_path(chart_name);
        std::fs::write(&path, content).map_err(|e| {
            HelmError::io(format!(
                "cannot write helm values to {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(path)
    }
}

fn creation_context(config_home: Option<&Path>) -> &'static str {
    match config_home {
        Some(_) => "cannot create tmp dir to write helm values",
        None => "unable to create tmp dir for HELM_CONFIG_HOME",
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        debug!(path = %self.dir.path().display(), "removing workspace");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_is_removed_on_drop() {
        let workspace = Workspace::new().unwrap();
        let path = workspace.path().to_path_buf();
        assert!(path.is_dir());
        assert!(
            path.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with(WORKSPACE_PREFIX)
        );

        let values = workspace.write_values("redis", b"a: 1\n").unwrap();
        assert_eq!(values, path.join("redis-kustomize-values.yaml"));
        assert_eq!(std::fs::read(&values).unwrap(), b"a: 1\n");

        drop(workspace);
        assert!(!path.exists());
    }

    #[test]
    fn test_config_home_default() {
        let workspace = Workspace::new().unwrap();
        assert_eq!(workspace.config_home(None), workspace.path().join("helm"));
        assert_eq!(
            workspace.config_home(Some(Path::new("/opt/helm"))),
            PathBuf::from("/opt/helm")
        );
    }

    #[test]
    fn test_creation_failure_names_purpose() {
        let missing = Path::new("/nonexistent/chartgen-parent");

        let context = creation_context(Some(Path::new("/opt/helm")));
        let err = Workspace::create(Some(missing), context).unwrap_err();
        assert!(matches!(err, HelmError::Io { .. }));
        assert!(
            err.to_string()
                .starts_with("cannot create tmp dir to write helm values: ")
        );
    }

    #[test]
    fn test_creation_context_without_config_home() {
        assert_eq!(
            creation_context(None),
            "unable to create tmp dir for HELM_CONFIG_HOME"
        );
    }

    #[test]
    fn test_for_chart_with_configured_home() {
        let workspace = Workspace::for_chart(Some(Path::new("/opt/helm"))).unwrap();
        assert!(workspace.path().is_dir());
        assert_eq!(
            workspace.config_home(Some(Path::new("/opt/helm"))),
            PathBuf::from("/opt/helm")
        );
    }

    #[test]
    fn test_workspaces_are_independent() {
        let first = Workspace::new().unwrap();
        let second = Workspace::new().unwrap();
        assert_ne!(first.path(), second.path());
    }
}
