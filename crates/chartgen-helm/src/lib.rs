//! chartgen helm - inflate helm charts into Kubernetes resources
//!
//! The generator shells out to a helm v3 binary:
//! - **Validation**: chart arguments and tool preconditions are checked up front
//! - **Chart resolution**: charts missing from the chart home are pulled from their repo
//! - **Values**: inline values are merged with the chart's values file
//!   (`merge`, `override`, `replace`)
//! - **Templating**: `helm template` output is parsed into a `ResMap`,
//!   skipping any preamble helm prints
//!
//! Every generation call works in its own temporary directory, removed when the call returns.

pub mod chart;
pub mod config;
pub mod error;
pub mod generator;
pub mod helm;
pub mod runner;
pub mod values;
pub mod workspace;

pub use config::{
    ChartSet, ChartSettings, HelmChart, HelmChartArgs, HelmConfig, HelmGlobals, parse_config,
};
pub use error::{HelmError, Result};
pub use generator::{HelmChartInflationGenerator, PluginHelpers, inflate_config};
pub use helm::{Helm, parse_helm_version};
pub use runner::{
    MockProcessRunner, ProcessOutput, ProcessRunner, RecordedCall, SystemProcessRunner,
};
pub use workspace::Workspace;
