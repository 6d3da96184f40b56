//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use chartgen_core::CoreError;
use chartgen_helm::HelmError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

const CONFIG_HELP: &str = "see `chartgen inflate --help` for the helm flags";

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Invalid configuration or missing helm settings
    #[error("{message}")]
    #[diagnostic(code(chartgen::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// helm version check failed
    #[error("{message}")]
    #[diagnostic(code(chartgen::cli::validation))]
    Validation { message: String },

    /// Undecodable values or helm output
    #[error("{message}")]
    #[diagnostic(code(chartgen::cli::parse))]
    Parse { message: String },

    /// IO error (file not found, permissions, etc.)
    #[error("{message}")]
    #[diagnostic(code(chartgen::cli::io))]
    Io { message: String },

    /// helm failed to run
    #[error("{message}")]
    #[diagnostic(code(chartgen::cli::subprocess))]
    Subprocess {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Anything else
    #[error("{message}")]
    #[diagnostic(code(chartgen::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Parse { .. } => exit_codes::PARSE_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Subprocess { .. } => exit_codes::SUBPROCESS_ERROR,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    /// Create an IO error with context
    pub fn io(context: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        Self::Io {
            message: format!("{}: {}", context, err),
        }
    }
}

impl From<HelmError> for CliError {
    fn from(err: HelmError) -> Self {
        let help = err.help().map(|h| h.to_string());
        let message = err.to_string();
        match err {
            HelmError::Config { .. } => CliError::Config {
                message,
                help: Some(CONFIG_HELP.to_string()),
            },
            HelmError::Validation { .. } => CliError::Validation { message },
            HelmError::Parse { .. } => CliError::Parse { message },
            HelmError::Subprocess { .. } => CliError::Subprocess { message, help },
            HelmError::Io { .. } => CliError::Io { message },
            _ => CliError::Internal { message },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        CliError::from(HelmError::from(err))
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_follow_error_kind() {
        let cases = [
            (HelmError::config("chart name cannot be empty"), exit_codes::CONFIG_ERROR),
            (HelmError::validation("this plugin requires helm V3"), exit_codes::VALIDATION_ERROR),
            (HelmError::parse("bad yaml"), exit_codes::PARSE_ERROR),
            (HelmError::io("unable to create tmp dir"), exit_codes::IO_ERROR),
            (
                HelmError::Subprocess {
                    message: "unable to run".into(),
                    stderr: String::new(),
                },
                exit_codes::SUBPROCESS_ERROR,
            ),
        ];

        for (err, code) in cases {
            assert_eq!(CliError::from(err).exit_code(), code);
        }
    }

    #[test]
    fn test_subprocess_help_is_kept() {
        let err = CliError::from(HelmError::Subprocess {
            message: "unable to run".into(),
            stderr: String::new(),
        });
        let CliError::Subprocess { help, .. } = err else {
            panic!("expected subprocess error");
        };
        assert!(help.unwrap().contains("helm v3 is installed"));
    }
}
