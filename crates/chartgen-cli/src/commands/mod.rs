//! CLI commands

pub mod helm_version;
pub mod inflate;
