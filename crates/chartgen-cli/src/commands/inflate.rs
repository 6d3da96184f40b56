//! Inflate command - render the charts of a generator configuration

use chartgen_core::{FileLoader, LoadRestrictor};
use chartgen_helm::{HelmConfig, PluginHelpers, inflate_config};
use console::style;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::error::{CliError, Result};

pub fn run(
    config_path: &Path,
    root: Option<&Path>,
    load_restrictor: LoadRestrictor,
    helm: HelmConfig,
    output: Option<&Path>,
) -> Result<()> {
    let config = fs::read(config_path).map_err(|e| {
        CliError::io(format!("failed to read {}", config_path.display()), e)
    })?;

    // Relative paths in the configuration are resolved against the
    // directory holding it, unless a root is given
    let root = root
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config_root(config_path));
    let loader = FileLoader::new(&root, load_restrictor)?;
    info!(
        root = %root.display(),
        restrictor = %load_restrictor,
        "loader ready"
    );

    let helpers = PluginHelpers::new(helm, Arc::new(loader));
    let resmap = inflate_config(&helpers, &config)?;
    info!(resources = resmap.len(), "inflated configuration");

    let yaml = resmap.to_yaml()?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| {
                    CliError::io(format!("failed to create {}", parent.display()), e)
                })?;
            }
            fs::write(path, &yaml).map_err(|e| {
                CliError::io(format!("failed to write {}", path.display()), e)
            })?;
            eprintln!(
                "{} {} ({} resources)",
                style("wrote").green().for_stderr(),
                path.display(),
                resmap.len()
            );
        }
        None => print!("{}", yaml),
    }

    Ok(())
}

fn config_root(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
