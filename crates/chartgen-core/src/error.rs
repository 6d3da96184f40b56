//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read '{path}': {source}")]
    Load {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("security; file '{path}' is not in or below '{root}'")]
    Restricted { path: String, root: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("values must be a mapping, got {found}")]
    ValuesNotMapping { found: String },

    #[error("invalid resource in document {index}: {message}")]
    InvalidResource { index: usize, message: String },

    #[error("may not add resource with an already registered id: {id}")]
    DuplicateResource { id: String },
}

impl CoreError {
    /// Whether this error comes from reading the filesystem rather than
    /// from decoding content.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            CoreError::Io(_) | CoreError::Load { .. } | CoreError::Restricted { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
