//! The helm binary: environment, invocation and version check

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{HelmError, Result};
use crate::runner::ProcessRunner;

/// Matches the first semantic-version-like token in `helm version` output
static VERSION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"v?\d+(\.\d+)+").expect("valid regex"));

/// Major version of helm this generator speaks to
pub const REQUIRED_MAJOR_VERSION: &str = "3";

/// A configured helm binary bound to a config home
pub struct Helm<'a> {
    command: &'a Path,
    config_home: PathBuf,
    runner: &'a dyn ProcessRunner,
}

impl<'a> Helm<'a> {
    pub fn new(command: &'a Path, config_home: PathBuf, runner: &'a dyn ProcessRunner) -> Self {
        Self {
            command,
            config_home,
            runner,
        }
    }

    pub fn config_home(&self) -> &Path {
        &self.config_home
    }

    /// Environment overrides pointing helm's config, cache and data at
    /// the config home
    pub fn env(&self) -> Vec<(String, String)> {
        let home = self.config_home.display();
        vec![
            ("HELM_CONFIG_HOME".to_string(), format!("{}", home)),
            ("HELM_CACHE_HOME".to_string(), format!("{}/.cache", home)),
            ("HELM_DATA_HOME".to_string(), format!("{}/.data", home)),
        ]
    }

    /// Run helm with `args`, returning stdout
    pub fn run(&self, args: &[String]) -> Result<Vec<u8>> {
        let env = self.env();
        debug!(
            command = %self.command.display(),
            args = %args.join(" "),
            config_home = %self.config_home.display(),
            "running helm"
        );

        match self.runner.run(self.command, args, &env) {
            Ok(output) if output.success => Ok(output.stdout),
            Ok(output) => Err(self.subprocess_error(
                args,
                &env,
                String::from_utf8_lossy(&output.stderr).into_owned(),
            )),
            Err(e) => Err(self.subprocess_error(args, &env, e.to_string())),
        }
    }

    fn subprocess_error(
        &self,
        args: &[String],
        env: &[(String, String)],
        stderr: String,
    ) -> HelmError {
        let helm = self.command.display();
        let env: Vec<String> = env.iter().map(|(k, v)| format!("{}={}", k, v)).collect();

        HelmError::Subprocess {
            message: format!(
                "unable to run: '{} {}' with env=[{}] (is '{}' installed?)",
                helm,
                args.join(" "),
                env.join(" "),
                helm
            ),
            stderr,
        }
    }

    /// Check that this binary is helm v3, returning the reported version
    /// without its leading `v`
    pub fn check_version(&self) -> Result<String> {
        let stdout = self.run(&["version", "-c", "--short"].map(String::from))?;
        parse_helm_version(&String::from_utf8_lossy(&stdout))
    }
}

/// Extract the helm version from `helm version --short` output and
/// require major version 3
pub fn parse_helm_version(output: &str) -> Result<String> {
    let found = VERSION_PATTERN.find(output).ok_or_else(|| {
        HelmError::validation(format!("cannot find version string in {}", output))
    })?;

    let version = found.as_str().strip_prefix('v').unwrap_or(found.as_str());
    let major = version.split('.').next().unwrap_or_default();
    if major != REQUIRED_MAJOR_VERSION {
        return Err(HelmError::validation(format!(
            "this plugin requires helm V3 but got v{}",
            version
        )));
    }

    Ok(version.to_string())
}
