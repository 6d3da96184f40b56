//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Validation error - helm reported an unsupported version
pub const VALIDATION_ERROR: i32 = 2;

/// Config error - invalid generator configuration or missing helm settings
pub const CONFIG_ERROR: i32 = 3;

/// Parse error - YAML in values or helm output could not be decoded
pub const PARSE_ERROR: i32 = 4;

/// IO error - file not found, permission denied, path outside the root
pub const IO_ERROR: i32 = 5;

/// Subprocess error - helm could not be started or exited non-zero
pub const SUBPROCESS_ERROR: i32 = 6;
