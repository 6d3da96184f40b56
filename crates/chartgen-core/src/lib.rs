//! chartgen core - shared types for manifest generators
//!
//! This crate provides:
//! - `Values`: chart values with the `merge` / `override` / `replace` policies
//! - `Loader`: root-restricted file loading
//! - `ResMap`: ordered, id-unique collections of Kubernetes resources

pub mod error;
pub mod loader;
pub mod resource;
pub mod values;

pub use error::{CoreError, Result};
pub use loader::{FileLoader, LoadRestrictor, Loader, MemoryLoader};
pub use resource::{ResId, ResMap, ResMapFactory, Resource, YamlResMapFactory};
pub use values::{UnknownValuesMerge, Values, ValuesMerge};
