//! Generator configuration
//!
//! Three layers of configuration feed a generator:
//! - [`HelmConfig`]: tool-level switches (is helm allowed at all, which binary)
//! - [`HelmGlobals`]: settings shared by every chart (chart home, helm config home)
//! - [`HelmChart`]: one chart to inflate, with its values and template options
//!
//! A configuration document is either a single plugin-style
//! [`HelmChartArgs`] (globals and chart fields side by side) or a
//! [`ChartSet`] with `helmGlobals` and a `helmCharts` list.

use chartgen_core::{Values, ValuesMerge};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{HelmError, Result};

/// Default directory, under the loader root, holding chart directories
pub const DEFAULT_CHART_HOME: &str = "charts";

/// Tool-level helm settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmConfig {
    /// helm may only run when explicitly enabled
    #[serde(default)]
    pub enabled: bool,

    /// Path or name of the helm binary
    #[serde(default)]
    pub command: String,
}

impl HelmConfig {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            enabled: true,
            command: command.into(),
        }
    }

    /// Check the preconditions for running any chart work
    pub fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Err(HelmError::config("must specify --enable-helm"));
        }
        if self.command.is_empty() {
            return Err(HelmError::config("must specify --helm-command"));
        }
        Ok(())
    }
}

/// Settings shared by all charts of a configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmGlobals {
    /// Directory holding chart directories, relative to the loader root
    /// unless absolute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_home: Option<String>,

    /// Directory for helm's own config, cache and data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_home: Option<String>,
}

/// One chart to inflate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmChart {
    #[serde(default)]
    pub name: String,

    /// Chart version constraint passed to `helm pull`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Repository URL, only needed when the chart is not present locally
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values_file: Option<String>,

    #[serde(default, skip_serializing_if = "Values::is_empty")]
    pub values_inline: Values,

    /// One of `merge`, `override`, `replace`; checked by validation so
    /// that the error can list the legal set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values_merge: Option<String>,

    #[serde(default, rename = "includeCRDs")]
    pub include_crds: bool,
}

/// Plugin-style configuration: globals and chart fields in one mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HelmChartArgs {
    #[serde(flatten)]
    pub globals: HelmGlobals,

    #[serde(flatten)]
    pub chart: HelmChart,
}

/// Several charts sharing one set of globals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSet {
    #[serde(default)]
    pub helm_globals: HelmGlobals,

    #[serde(default)]
    pub helm_charts: Vec<HelmChart>,
}

impl ChartSet {
    /// Pair every chart with the shared globals
    pub fn into_args(self) -> Vec<HelmChartArgs> {
        let globals = self.helm_globals;
        self.helm_charts
            .into_iter()
            .map(|chart| HelmChartArgs {
                globals: globals.clone(),
                chart,
            })
            .collect()
    }
}

/// Parse a configuration document (YAML or JSON) into chart arguments
///
/// A document with a `helmCharts` key is read as a [`ChartSet`]; anything
/// else as a single [`HelmChartArgs`].
pub fn parse_config(config: &[u8]) -> Result<Vec<HelmChartArgs>> {
    let document: serde_yaml::Value = serde_yaml::from_slice(config)?;

    if document.get("helmCharts").is_some() {
        let set: ChartSet = serde_yaml::from_value(document)?;
        Ok(set.into_args())
    } else {
        let args: HelmChartArgs = serde_yaml::from_value(document)?;
        Ok(vec![args])
    }
}

/// Validated settings for one chart, with every default filled in
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSettings {
    pub name: String,
    pub repo: Option<String>,
    pub version: Option<String>,
    pub chart_home: PathBuf,
    /// `None` means "inside the per-call workspace"
    pub config_home: Option<PathBuf>,
    pub values_file: PathBuf,
    pub values_inline: Values,
    pub values_merge: ValuesMerge,
    pub release_name: Option<String>,
    pub namespace: Option<String>,
    pub include_crds: bool,
}

impl HelmChartArgs {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            chart: HelmChart {
                name: name.into(),
                ..HelmChart::default()
            },
            ..Self::default()
        }
    }

    /// Populate defaults and enforce invariants
    pub fn validate(self) -> Result<ChartSettings> {
        let HelmChartArgs { globals, chart } = self;

        if chart.name.is_empty() {
            return Err(HelmError::config("chart name cannot be empty"));
        }

        let chart_home = PathBuf::from(
            non_empty(globals.chart_home).unwrap_or_else(|| DEFAULT_CHART_HOME.to_string()),
        );

        let values_file = non_empty(chart.values_file)
            .map(PathBuf::from)
            .unwrap_or_else(|| default_values_file(&chart_home, &chart.name));

        let values_inline = Values::from_value(chart.values_inline.into_inner())
            .map_err(|e| HelmError::config(format!("invalid valuesInline: {}", e)))?;

        let values_merge = match non_empty(chart.values_merge) {
            None => ValuesMerge::default(),
            Some(option) => option
                .parse::<ValuesMerge>()
                .map_err(|e| HelmError::config(e.to_string()))?,
        };

        Ok(ChartSettings {
            name: chart.name,
            repo: non_empty(chart.repo),
            version: non_empty(chart.version),
            chart_home,
            config_home: non_empty(globals.config_home).map(PathBuf::from),
            values_file,
            values_inline,
            values_merge,
            release_name: non_empty(chart.release_name),
            namespace: non_empty(chart.namespace),
            include_crds: chart.include_crds,
        })
    }
}

fn default_values_file(chart_home: &Path, name: &str) -> PathBuf {
    chart_home.join(name).join("values.yaml")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
