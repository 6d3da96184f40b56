//! Helm version command - check that the configured helm binary is v3

use chartgen_helm::{Helm, HelmConfig, SystemProcessRunner, Workspace};
use console::style;
use std::path::Path;

use crate::error::Result;

pub fn run(helm_command: &str) -> Result<()> {
    // Only the binary matters here, helm does not have to be enabled
    let config = HelmConfig::new(helm_command);
    config.validate()?;

    let workspace = Workspace::new()?;
    let runner = SystemProcessRunner;
    let helm = Helm::new(
        Path::new(&config.command),
        workspace.config_home(None),
        &runner,
    );

    let version = helm.check_version()?;
    println!("{} helm v{}", style("ok").green(), version);
    Ok(())
}
