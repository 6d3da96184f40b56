//! The chart inflation generator
//!
//! [`HelmChartInflationGenerator::generate`] runs the whole pipeline:
//!
//! 1. Acquire a [`Workspace`]
//! 2. Check that the helm binary is v3
//! 3. Make sure the chart exists locally, pulling it if a repo is configured
//! 4. Write the values file into the workspace
//! 5. Run `helm template` and parse its stdout into a [`ResMap`]
//!
//! The workspace is released when `generate` returns, on every path.

use chartgen_core::{Loader, ResMap, ResMapFactory, YamlResMapFactory};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::chart::{abs_chart_home, ensure_chart};
use crate::config::{ChartSettings, HelmChartArgs, HelmConfig, parse_config};
use crate::error::{HelmError, Result};
use crate::helm::Helm;
use crate::runner::{ProcessRunner, SystemProcessRunner};
use crate::values::resolve_values_file;
use crate::workspace::Workspace;

/// Separator searched for when helm prints text before the YAML stream
const DOCUMENT_SEPARATOR: &[u8] = b"---";

/// Collaborators handed to every generator
#[derive(Clone)]
pub struct PluginHelpers {
    helm: HelmConfig,
    loader: Arc<dyn Loader>,
    factory: Arc<dyn ResMapFactory>,
    runner: Arc<dyn ProcessRunner>,
}

impl PluginHelpers {
    /// Helpers running the real helm binary and parsing YAML streams
    pub fn new(helm: HelmConfig, loader: Arc<dyn Loader>) -> Self {
        Self {
            helm,
            loader,
            factory: Arc::new(YamlResMapFactory),
            runner: Arc::new(SystemProcessRunner),
        }
    }

    pub fn with_res_map_factory(mut self, factory: Arc<dyn ResMapFactory>) -> Self {
        self.factory = factory;
        self
    }

    pub fn with_runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn helm_config(&self) -> &HelmConfig {
        &self.helm
    }

    pub fn loader(&self) -> &dyn Loader {
        self.loader.as_ref()
    }

    pub fn res_map_factory(&self) -> &dyn ResMapFactory {
        self.factory.as_ref()
    }

    pub fn runner(&self) -> &dyn ProcessRunner {
        self.runner.as_ref()
    }

    fn helm_command(&self) -> &Path {
        Path::new(&self.helm.command)
    }
}

/// Inflates one helm chart into Kubernetes resources
pub struct HelmChartInflationGenerator {
    helpers: PluginHelpers,
    settings: ChartSettings,
}

impl HelmChartInflationGenerator {
    /// Create a generator for one chart
    ///
    /// Fails fast on disabled helm, a missing helm command or invalid
    /// chart arguments; nothing is run at this point.
    pub fn new(helpers: PluginHelpers, args: HelmChartArgs) -> Result<Self> {
        helpers.helm_config().validate()?;
        let settings = args.validate()?;
        Ok(Self { helpers, settings })
    }

    /// Create a generator from a plugin configuration document
    ///
    /// The document must describe exactly one chart; use
    /// [`inflate_config`] for chart sets.
    pub fn from_config(helpers: PluginHelpers, config: &[u8]) -> Result<Self> {
        helpers.helm_config().validate()?;
        let mut charts = parse_config(config)?;
        if charts.len() != 1 {
            return Err(HelmError::config(format!(
                "expected exactly one chart, found {}",
                charts.len()
            )));
        }
        Self::new(helpers, charts.remove(0))
    }

    pub fn settings(&self) -> &ChartSettings {
        &self.settings
    }

    /// Chart home resolved against the loader root
    pub fn abs_chart_home(&self) -> PathBuf {
        abs_chart_home(self.helpers.loader().root(), &self.settings.chart_home)
    }

    /// Arguments for `helm template`
    pub fn template_args(&self, values_file: &Path) -> Vec<String> {
        let settings = &self.settings;
        let mut args = vec!["template".to_string()];

        if let Some(release) = &settings.release_name {
            args.push(release.clone());
        }
        if let Some(namespace) = &settings.namespace {
            args.push("--namespace".to_string());
            args.push(namespace.clone());
        }
        args.push(
            self.abs_chart_home()
                .join(&settings.name)
                .display()
                .to_string(),
        );
        args.push("--values".to_string());
        args.push(values_file.display().to_string());
        if settings.release_name.is_none() {
            args.push("--generate-name".to_string());
        }
        if settings.include_crds {
            args.push("--include-crds".to_string());
        }
        args
    }

    /// Inflate the chart
    pub fn generate(&self) -> Result<ResMap> {
        let workspace = Workspace::for_chart(self.settings.config_home.as_deref())?;
        self.generate_in(&workspace)
    }

    fn generate_in(&self, workspace: &Workspace) -> Result<ResMap> {
        let config_home = workspace.config_home(self.settings.config_home.as_deref());
        let helm = Helm::new(
            self.helpers.helm_command(),
            config_home,
            self.helpers.runner(),
        );

        let version = helm.check_version()?;
        debug!(
            chart = %self.settings.name,
            helm_version = %version,
            "helm version ok"
        );

        let chart_home = self.abs_chart_home();
        ensure_chart(&self.settings, &chart_home, &helm)?;

        let values_file = resolve_values_file(&self.settings, self.helpers.loader(), workspace)?;

        let stdout = helm.run(&self.template_args(&values_file))?;
        self.parse_output(&stdout)
    }

    /// Parse `helm template` output, retrying from the first `---` when
    /// helm printed something before the YAML stream
    fn parse_output(&self, stdout: &[u8]) -> Result<ResMap> {
        let factory = self.helpers.res_map_factory();
        let err = match factory.from_bytes(stdout) {
            Ok(resmap) => return Ok(resmap),
            Err(e) => e,
        };

        if let Some(idx) = find_separator(stdout) {
            let skipped = String::from_utf8_lossy(&stdout[..idx]);
            warn!(
                chart = %self.settings.name,
                skipped = %skipped.trim(),
                "helm output did not parse, retrying from first document separator"
            );
            match factory.from_bytes(&stdout[idx..]) {
                Ok(resmap) => return Ok(resmap),
                Err(retry) => debug!(error = %retry, "retry after separator failed"),
            }
        }

        Err(HelmError::parse(err.to_string()))
    }
}

fn find_separator(stdout: &[u8]) -> Option<usize> {
    stdout
        .windows(DOCUMENT_SEPARATOR.len())
        .position(|w| w == DOCUMENT_SEPARATOR)
}

/// Inflate every chart of a configuration document, concatenating the
/// results in order
///
/// All charts are validated before helm runs for any of them.
pub fn inflate_config(helpers: &PluginHelpers, config: &[u8]) -> Result<ResMap> {
    helpers.helm_config().validate()?;

    let generators = parse_config(config)?
        .into_iter()
        .map(|args| HelmChartInflationGenerator::new(helpers.clone(), args))
        .collect::<Result<Vec<_>>>()?;

    let mut all = ResMap::new();
    for generator in generators {
        let resmap = generator.generate()?;
        debug!(
            chart = %generator.settings().name,
            resources = resmap.len(),
            "inflated chart"
        );
        all.append_all(resmap)?;
    }
    Ok(all)
}
