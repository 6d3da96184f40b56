//! Loading files relative to a root directory
//!
//! Generators read their inputs (values files, mostly) through a [`Loader`]
//! so that a configuration cannot reach outside the directory it was
//! loaded from unless the caller explicitly lifts that restriction.
//!
//! # Security
//!
//! With [`LoadRestrictor::RootOnly`]:
//! - Relative paths are resolved against the root
//! - Paths are canonicalized, so `..` components and symlinks are followed
//! - The resolved file must be in or below the root
//!
//! With [`LoadRestrictor::None`], relative paths are still resolved against
//! the root but any file on the filesystem may be read.

use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Whether loads are confined to the loader root
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoadRestrictor {
    /// Files must be in or below the root
    #[default]
    RootOnly,
    /// Any file may be loaded
    None,
}

impl LoadRestrictor {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadRestrictor::RootOnly => "rootOnly",
            LoadRestrictor::None => "none",
        }
    }
}

impl fmt::Display for LoadRestrictor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoadRestrictor {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "rootOnly" | "LoadRestrictionsRootOnly" => Ok(LoadRestrictor::RootOnly),
            "none" | "LoadRestrictionsNone" => Ok(LoadRestrictor::None),
            other => Err(format!(
                "unknown load restrictor '{}', expected one of [rootOnly, none]",
                other
            )),
        }
    }
}

/// Trait for file loaders
///
/// Implementations:
/// - `FileLoader`: real filesystem access
/// - `MemoryLoader`: in-memory files for testing
pub trait Loader: Send + Sync {
    /// Directory that relative paths are resolved against
    fn root(&self) -> &Path;

    /// Restriction applied by [`Loader::load`]
    fn restrictor(&self) -> LoadRestrictor;

    /// Read the full contents of a file
    fn load(&self, path: &Path) -> Result<Vec<u8>>;

    /// Resolve `path` against the root without touching the filesystem
    fn join_root(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root().join(path)
        }
    }
}

/// Loader backed by the real filesystem
#[derive(Debug, Clone)]
pub struct FileLoader {
    /// Canonicalized root, used both for joining and for containment checks
    root: PathBuf,
    restrictor: LoadRestrictor,
}

impl FileLoader {
    /// Create a loader rooted at `root`
    ///
    /// # Errors
    ///
    /// Returns an error if the root doesn't exist or cannot be canonicalized.
    pub fn new(root: impl AsRef<Path>, restrictor: LoadRestrictor) -> Result<Self> {
        let root = root.as_ref();
        let canonical = root.canonicalize().map_err(|e| CoreError::Load {
            path: root.display().to_string(),
            source: e,
        })?;

        Ok(Self {
            root: canonical,
            restrictor,
        })
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf> {
        let full_path = self.join_root(path);

        if self.restrictor == LoadRestrictor::None {
            return Ok(full_path);
        }

        let canonical = full_path.canonicalize().map_err(|e| CoreError::Load {
            path: path.display().to_string(),
            source: e,
        })?;

        if !canonical.starts_with(&self.root) {
            return Err(CoreError::Restricted {
                path: canonical.display().to_string(),
                root: self.root.display().to_string(),
            });
        }

        Ok(canonical)
    }
}

impl Loader for FileLoader {
    fn root(&self) -> &Path {
        &self.root
    }

    fn restrictor(&self) -> LoadRestrictor {
        self.restrictor
    }

    fn load(&self, path: &Path) -> Result<Vec<u8>> {
        let resolved = self.resolve(path)?;
        std::fs::read(&resolved).map_err(|e| CoreError::Load {
            path: resolved.display().to_string(),
            source: e,
        })
    }
}

/// In-memory loader for testing
///
/// Paths are normalized lexically, so `..` cannot be used to escape a
/// restricted root.
#[derive(Debug, Clone)]
pub struct MemoryLoader {
    root: PathBuf,
    restrictor: LoadRestrictor,
    files: HashMap<PathBuf, Vec<u8>>,
}

impl MemoryLoader {
    /// Create an empty loader with a virtual root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            restrictor: LoadRestrictor::RootOnly,
            files: HashMap::new(),
        }
    }

    pub fn with_restrictor(mut self, restrictor: LoadRestrictor) -> Self {
        self.restrictor = restrictor;
        self
    }

    /// Add a file, relative to the root unless absolute
    pub fn with_file(mut self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) -> Self {
        let full = normalize(&self.join_root(path.as_ref()));
        self.files.insert(full, content.into());
        self
    }
}

impl Loader for MemoryLoader {
    fn root(&self) -> &Path {
        &self.root
    }

    fn restrictor(&self) -> LoadRestrictor {
        self.restrictor
    }

    fn load(&self, path: &Path) -> Result<Vec<u8>> {
        let full = normalize(&self.join_root(path));
        if self.restrictor == LoadRestrictor::RootOnly && !full.starts_with(normalize(&self.root)) {
            return Err(CoreError::Restricted {
                path: full.display().to_string(),
                root: self.root.display().to_string(),
            });
        }

        self.files
            .get(&full)
            .cloned()
            .ok_or_else(|| CoreError::Load {
                path: full.display().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            })
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}
