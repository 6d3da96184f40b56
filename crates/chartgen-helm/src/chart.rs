//! Locating charts on disk and pulling missing ones

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::ChartSettings;
use crate::error::{HelmError, Result};
use crate::helm::Helm;

/// Chart home as an absolute path: used as-is when absolute, otherwise
/// joined onto the loader root
pub fn abs_chart_home(root: &Path, chart_home: &Path) -> PathBuf {
    if chart_home.is_absolute() {
        chart_home.to_path_buf()
    } else {
        root.join(chart_home)
    }
}

/// Arguments for `helm pull` into `chart_home`
pub fn pull_args(settings: &ChartSettings, chart_home: &Path, repo: &str) -> Vec<String> {
    let mut args = vec![
        "pull".to_string(),
        "--untar".to_string(),
        "--untardir".to_string(),
        chart_home.display().to_string(),
        "--repo".to_string(),
        repo.to_string(),
        settings.name.clone(),
    ];
    if let Some(version) = &settings.version {
        args.push("--version".to_string());
        args.push(version.clone());
    }
    args
}

/// Make sure `<chart_home>/<name>` exists, pulling it when a repo is
/// configured. Returns the chart directory.
pub fn ensure_chart(
    settings: &ChartSettings,
    chart_home: &Path,
    helm: &Helm<'_>,
) -> Result<PathBuf> {
    let chart_dir = chart_home.join(&settings.name);
    if chart_dir.is_dir() {
        debug!(chart = %chart_dir.display(), "using local chart");
        return Ok(chart_dir);
    }

    let Some(repo) = &settings.repo else {
        return Err(HelmError::config(format!(
            "no repo specified for pull, no chart found at '{}'",
            chart_dir.display()
        )));
    };

    debug!(chart = %settings.name, repo = %repo, "pulling chart");
    helm.run(&pull_args(settings, chart_home, repo))?;
    Ok(chart_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HelmChartArgs;
    use crate::runner::MockProcessRunner;
    use tempfile::TempDir;

    fn settings(name: &str, repo: Option<&str>, version: Option<&str>) -> ChartSettings {
        let mut args = HelmChartArgs::new(name);
        args.chart.repo = repo.map(String::from);
        args.chart.version = version.map(String::from);
        args.validate().unwrap()
    }

    #[test]
    fn test_abs_chart_home() {
        assert_eq!(
            abs_chart_home(Path::new("/app"), Path::new("charts")),
            PathBuf::from("/app/charts")
        );
        assert_eq!(
            abs_chart_home(Path::new("/app"), Path::new("/opt/charts")),
            PathBuf::from("/opt/charts")
        );
    }

    #[test]
    fn test_pull_args() {
        let args = pull_args(
            &settings("minecraft", None, Some("3.1.3")),
            Path::new("/app/charts"),
            "https://itzg.github.io/minecraft-server-charts",
        );
        insta::assert_snapshot!(
            args.join(" "),
            @"pull --untar --untardir /app/charts --repo https://itzg.github.io/minecraft-server-charts minecraft --version 3.1.3"
        );

        let args = pull_args(&settings("redis", None, None), Path::new("/c"), "https://r");
        assert_eq!(args.last().map(String::as_str), Some("redis"));
    }

    #[test]
    fn test_local_chart_skips_pull() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("redis")).unwrap();
        let runner = MockProcessRunner::helm_v3();
        let helm = Helm::new(Path::new("helm"), temp.path().join("h"), &runner);

        let settings = settings("redis", Some("https://r"), None);
        let dir = ensure_chart(&settings, temp.path(), &helm).unwrap();
        assert_eq!(dir, temp.path().join("redis"));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_missing_chart_without_repo() {
        let temp = TempDir::new().unwrap();
        let runner = MockProcessRunner::helm_v3();
        let helm = Helm::new(Path::new("helm"), temp.path().join("h"), &runner);

        let err = ensure_chart(&settings("redis", None, None), temp.path(), &helm).unwrap_err();
        assert!(matches!(err, HelmError::Config { .. }));
        assert!(err.to_string().contains("no repo specified for pull"));
        let chart_dir = temp.path().join("redis").display().to_string();
        assert!(err.to_string().contains(&chart_dir));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_missing_chart_is_pulled() {
        let temp = TempDir::new().unwrap();
        let runner = MockProcessRunner::helm_v3();
        let helm = Helm::new(Path::new("helm"), temp.path().join("h"), &runner);

        let settings = settings("redis", Some("https://r"), Some("1.2.3"));
        ensure_chart(&settings, temp.path(), &helm).unwrap();

        let pull = runner.last_call("pull").unwrap();
        assert_eq!(
            pull.flag_value("--untardir"),
            Some(temp.path().to_str().unwrap())
        );
        assert_eq!(pull.flag_value("--repo"), Some("https://r"));
        assert_eq!(pull.flag_value("--version"), Some("1.2.3"));
    }

    #[test]
    fn test_pull_failure_propagates() {
        let temp = TempDir::new().unwrap();
        let runner = MockProcessRunner::helm_v3().with_failure("pull", "Error: chart not found");
        let helm = Helm::new(Path::new("helm"), temp.path().join("h"), &runner);

        let settings = settings("redis", Some("https://r"), None);
        let err = ensure_chart(&settings, temp.path(), &helm).unwrap_err();
        assert!(matches!(err, HelmError::Subprocess { .. }));
        assert!(
            err.to_string()
                .starts_with("Error: chart not found: unable to run: 'helm pull")
        );
    }
}
