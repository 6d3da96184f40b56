//! Resolving the values file handed to `helm template`

use chartgen_core::{Loader, Values};
use std::path::PathBuf;
use tracing::debug;

use crate::config::ChartSettings;
use crate::error::Result;
use crate::workspace::Workspace;

/// Inline values combined with the chart's values file per the merge
/// policy. Only meaningful when inline values are present.
pub fn merged_values(settings: &ChartSettings, loader: &dyn Loader) -> Result<Values> {
    if !settings.values_merge.needs_base() {
        return Ok(settings.values_inline.clone());
    }

    let base = Values::from_slice(&loader.load(&settings.values_file)?)?;
    Ok(settings.values_merge.apply(base, &settings.values_inline))
}

/// Write the values for this chart into the workspace and return the
/// file's absolute path
///
/// Without inline values the configured values file is copied verbatim,
/// so helm always reads its values from the workspace.
pub fn resolve_values_file(
    settings: &ChartSettings,
    loader: &dyn Loader,
    workspace: &Workspace,
) -> Result<PathBuf> {
    let content = if settings.values_inline.is_empty() {
        loader.load(&settings.values_file)?
    } else {
        merged_values(settings, loader)?.to_yaml()?.into_bytes()
    };

    let path = workspace.write_values(&settings.name, &content)?;
    debug!(
        values = %path.display(),
        merge = %settings.values_merge,
        inline = !settings.values_inline.is_empty(),
        "resolved values file"
    );
    Ok(path)
}
