//! Error types for chartgen-helm

use chartgen_core::CoreError;
use miette::Diagnostic;
use thiserror::Error;

/// Result type for chart inflation
pub type Result<T> = std::result::Result<T, HelmError>;

/// Errors that can occur while inflating a chart
#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum HelmError {
    /// Bad or missing configuration
    #[error("{message}")]
    #[diagnostic(code(chartgen::helm::config))]
    Config { message: String },

    /// Filesystem, loader or temporary directory failure
    #[error("{message}")]
    #[diagnostic(code(chartgen::helm::io))]
    Io { message: String },

    /// YAML decoding or resource map construction failure
    #[error("{message}")]
    #[diagnostic(code(chartgen::helm::parse))]
    Parse { message: String },

    /// helm exited non-zero or could not be started
    #[error("{}{message}", stderr_prefix(.stderr))]
    #[diagnostic(
        code(chartgen::helm::subprocess),
        help("check that helm v3 is installed and that --helm-command points at it")
    )]
    Subprocess { message: String, stderr: String },

    /// helm reported an unusable version
    #[error("{message}")]
    #[diagnostic(code(chartgen::helm::validation))]
    Validation { message: String },
}

fn stderr_prefix(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!("{}: ", stderr)
    }
}

impl HelmError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Short name of the error kind, used in logs and exit code mapping
    pub fn kind(&self) -> &'static str {
        match self {
            HelmError::Config { .. } => "config",
            HelmError::Io { .. } => "io",
            HelmError::Parse { .. } => "parse",
            HelmError::Subprocess { .. } => "subprocess",
            HelmError::Validation { .. } => "validation",
        }
    }
}

impl From<CoreError> for HelmError {
    fn from(e: CoreError) -> Self {
        if e.is_io() {
            HelmError::io(e.to_string())
        } else {
            HelmError::parse(e.to_string())
        }
    }
}

impl From<std::io::Error> for HelmError {
    fn from(e: std::io::Error) -> Self {
        HelmError::io(e.to_string())
    }
}

impl From<serde_yaml::Error> for HelmError {
    fn from(e: serde_yaml::Error) -> Self {
        HelmError::parse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_are_classified() {
        let restricted = CoreError::Restricted {
            path: "/etc/passwd".into(),
            root: "/app".into(),
        };
        assert_eq!(HelmError::from(restricted).kind(), "io");

        let invalid = CoreError::InvalidResource {
            index: 0,
            message: "document is not a mapping".into(),
        };
        assert_eq!(HelmError::from(invalid).kind(), "parse");
    }

    #[test]
    fn test_subprocess_display_leads_with_stderr() {
        let err = HelmError::Subprocess {
            message: "unable to run: 'helm version'".into(),
            stderr: "Error: boom\n".into(),
        };
        assert_eq!(
            err.to_string(),
            "Error: boom: unable to run: 'helm version'"
        );

        let err = HelmError::Subprocess {
            message: "unable to run: 'helm version'".into(),
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "unable to run: 'helm version'");
    }
}
