//! Integration tests for the chartgen binary, driven by a fake helm script

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const FAKE_HELM: &str = r#"#!/bin/sh
case "$1" in
  version)
    echo "${FAKE_HELM_VERSION:-v3.14.2+gc309b6f}"
    ;;
  template)
    while [ $# -gt 0 ]; do
      if [ "$1" = "--values" ]; then
        cp "$2" "$OUT_DIR/values.yaml"
      fi
      shift
    done
    echo "$HELM_CONFIG_HOME" > "$OUT_DIR/config-home"
    echo "WARNING: Kubernetes configuration file is group-readable"
    echo "---"
    echo "apiVersion: v1"
    echo "kind: ConfigMap"
    echo "metadata:"
    echo "  name: server-settings"
    echo "data:"
    echo "  difficulty: hard"
    ;;
  *)
    echo "unexpected helm call: $*" >&2
    exit 1
    ;;
esac
"#;

const CONFIG: &str = "\
name: minecraft
releaseName: moria
valuesInline:
  replicas: 3
";

/// A project directory holding the configuration, a local chart and the
/// fake helm binary
struct Project {
    dir: TempDir,
}

impl Project {
    fn new(config: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let chart = dir.path().join("charts/minecraft");
        std::fs::create_dir_all(chart.join("templates")).unwrap();
        std::fs::write(chart.join("values.yaml"), "replicas: 1\nmotd: hello\n").unwrap();
        std::fs::write(dir.path().join("helm.yaml"), config).unwrap();

        let helm = dir.path().join("fake-helm");
        std::fs::write(&helm, FAKE_HELM).unwrap();
        std::fs::set_permissions(&helm, std::fs::Permissions::from_mode(0o755)).unwrap();

        std::fs::create_dir_all(dir.path().join("out")).unwrap();
        Self { dir }
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_chartgen"));
        cmd.env_remove("CHARTGEN_ENABLE_HELM")
            .env_remove("CHARTGEN_HELM_COMMAND")
            .env_remove("RUST_LOG")
            .env("OUT_DIR", self.path("out"));
        cmd
    }

    fn inflate(&self, extra: &[&str]) -> Output {
        self.command()
            .arg("inflate")
            .arg(self.path("helm.yaml"))
            .arg("--helm-command")
            .arg(self.path("fake-helm"))
            .args(extra)
            .output()
            .expect("Failed to execute chartgen")
    }
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn recorded_config_home(project: &Project) -> PathBuf {
    let home = std::fs::read_to_string(project.path("out/config-home")).unwrap();
    PathBuf::from(home.trim())
}

mod inflate_command {
    use super::*;

    #[test]
    fn test_inflate_prints_resources() {
        let project = Project::new(CONFIG);
        let output = project.inflate(&["--enable-helm"]);

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("kind: ConfigMap"));
        assert!(stdout.contains("name: server-settings"));
        assert!(!stdout.contains("WARNING"));
    }

    #[test]
    fn test_inflate_merges_inline_values() {
        let project = Project::new(CONFIG);
        let output = project.inflate(&["--enable-helm"]);
        assert!(output.status.success(), "stderr: {}", stderr(&output));

        let values = std::fs::read_to_string(project.path("out/values.yaml")).unwrap();
        assert!(values.contains("replicas: 3"));
        assert!(values.contains("motd: hello"));
    }

    #[test]
    fn test_inflate_removes_workspace() {
        let project = Project::new(CONFIG);
        let output = project.inflate(&["--enable-helm"]);
        assert!(output.status.success(), "stderr: {}", stderr(&output));

        let config_home = recorded_config_home(&project);
        assert_eq!(config_home.file_name().unwrap(), "helm");
        let workspace = config_home.parent().unwrap();
        assert!(
            workspace
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("kustomize-helm-")
        );
        assert!(!workspace.exists());
    }

    #[test]
    fn test_inflate_enable_helm_from_env() {
        let project = Project::new(CONFIG);
        let output = project
            .command()
            .env("CHARTGEN_ENABLE_HELM", "true")
            .env("CHARTGEN_HELM_COMMAND", project.path("fake-helm"))
            .arg("inflate")
            .arg(project.path("helm.yaml"))
            .output()
            .unwrap();

        assert!(output.status.success(), "stderr: {}", stderr(&output));
    }

    #[test]
    fn test_inflate_writes_output_file() {
        let project = Project::new(CONFIG);
        let target = project.path("rendered/all.yaml");
        let output = project.inflate(&["--enable-helm", "-o", target.to_str().unwrap()]);

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(output.stdout.is_empty());
        assert!(stderr(&output).contains("wrote"));
        let written = std::fs::read_to_string(&target).unwrap();
        assert!(written.contains("difficulty: hard"));
    }

    #[test]
    fn test_inflate_requires_enable_helm() {
        let project = Project::new(CONFIG);
        let output = project.inflate(&[]);

        assert_eq!(output.status.code(), Some(3));
        assert!(stderr(&output).contains("must specify --enable-helm"));
        assert!(!project.path("out/config-home").exists());
    }

    #[test]
    fn test_inflate_rejects_helm_v2() {
        let project = Project::new(CONFIG);
        let output = project
            .command()
            .env("FAKE_HELM_VERSION", "Client: v2.16.1+gbbdfe5e")
            .arg("inflate")
            .arg(project.path("helm.yaml"))
            .arg("--enable-helm")
            .arg("--helm-command")
            .arg(project.path("fake-helm"))
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(2));
        assert!(
            stderr(&output).contains("this plugin requires helm V3 but got v2.16.1")
        );
    }

    #[test]
    fn test_inflate_missing_chart_without_repo() {
        let project = Project::new("name: redis\n");
        let output = project.inflate(&["--enable-helm"]);

        assert_eq!(output.status.code(), Some(3));
        assert!(
            stderr(&output).contains("no repo specified for pull, no chart found at")
        );
    }

    #[test]
    fn test_inflate_missing_config_file() {
        let project = Project::new(CONFIG);
        let output = project
            .command()
            .arg("inflate")
            .arg(project.path("nope.yaml"))
            .arg("--enable-helm")
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(5));
        assert!(stderr(&output).contains("failed to read"));
    }

    #[test]
    fn test_inflate_missing_helm_binary() {
        let project = Project::new(CONFIG);
        let output = project
            .command()
            .arg("inflate")
            .arg(project.path("helm.yaml"))
            .args(["--enable-helm", "--helm-command", "/no/such/helm"])
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(6));
        assert!(stderr(&output).contains("(is '/no/such/helm' installed?)"));
    }
}

mod helm_version_command {
    use super::*;

    fn helm_version(project: &Project, helm: &Path) -> Output {
        project
            .command()
            .arg("helm-version")
            .arg("--helm-command")
            .arg(helm)
            .output()
            .unwrap()
    }

    #[test]
    fn test_helm_version_ok() {
        let project = Project::new(CONFIG);
        let output = helm_version(&project, &project.path("fake-helm"));

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("helm v3.14.2"));
    }

    #[test]
    fn test_helm_version_missing_binary() {
        let project = Project::new(CONFIG);
        let output = helm_version(&project, Path::new("/no/such/helm"));

        assert_eq!(output.status.code(), Some(6));
    }
}
