//! Kubernetes resources parsed from YAML streams
//!
//! A [`ResMap`] is the ordered collection generators hand back to their
//! caller. It is built from a multi-document YAML stream by a
//! [`ResMapFactory`]; every document must be a Kubernetes object with a
//! `kind` and a `metadata.name`, and no two objects may share an id.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::fmt;

use crate::error::{CoreError, Result};

/// Identity of a resource: group, version, kind, namespace and name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResId {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub namespace: Option<String>,
    pub name: String,
}

impl ResId {
    pub fn new(api_version: &str, kind: &str, namespace: Option<&str>, name: &str) -> Self {
        let (group, version) = match api_version.split_once('/') {
            Some((group, version)) => (group, version),
            None => ("", api_version),
        };

        Self {
            group: group.to_string(),
            version: version.to_string(),
            kind: kind.to_string(),
            namespace: namespace.filter(|ns| !ns.is_empty()).map(String::from),
            name: name.to_string(),
        }
    }

    /// `apiVersion` as written in a manifest
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

impl fmt::Display for ResId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let or = |s: &str, placeholder: &'static str| -> String {
            if s.is_empty() {
                placeholder.to_string()
            } else {
                s.to_string()
            }
        };

        write!(
            f,
            "{}_{}_{}|{}|{}",
            or(&self.group, "~G"),
            or(&self.version, "~V"),
            self.kind,
            self.namespace.as_deref().unwrap_or("~X"),
            self.name
        )
    }
}

/// A single Kubernetes object
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    id: ResId,
    value: Mapping,
}

impl Resource {
    /// Build a resource from a parsed document
    ///
    /// `index` is the position of the document in its stream and only
    /// used in error messages.
    pub fn from_value(index: usize, value: Value) -> Result<Self> {
        let invalid = |message: &str| CoreError::InvalidResource {
            index,
            message: message.to_string(),
        };

        let Value::Mapping(value) = value else {
            return Err(invalid("document is not a mapping"));
        };

        let kind = str_field(&value, "kind").unwrap_or_default();
        if kind.is_empty() {
            return Err(invalid("missing kind"));
        }
        let api_version = str_field(&value, "apiVersion").unwrap_or_default();

        let metadata = value.get("metadata").and_then(Value::as_mapping);
        let name = metadata
            .and_then(|m| str_field(m, "name"))
            .unwrap_or_default();
        if name.is_empty() {
            let message = format!("missing metadata.name in {} object", kind);
            return Err(invalid(&message));
        }
        let namespace = metadata.and_then(|m| str_field(m, "namespace"));

        let id = ResId::new(api_version, kind, namespace, name);
        Ok(Self { id, value })
    }

    /// Parse a single YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(yaml)?;
        Self::from_value(0, value)
    }

    pub fn id(&self) -> &ResId {
        &self.id
    }

    pub fn kind(&self) -> &str {
        &self.id.kind
    }

    pub fn name(&self) -> &str {
        &self.id.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.id.namespace.as_deref()
    }

    pub fn value(&self) -> &Mapping {
        &self.value
    }

    /// Look up a nested field by dotted path (e.g. `data.key`)
    pub fn field(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        parts.try_fold(self.value.get(first)?, |current, part| current.get(part))
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.value)?)
    }
}

fn str_field<'a>(mapping: &'a Mapping, key: &str) -> Option<&'a str> {
    mapping.get(key).and_then(Value::as_str)
}

/// Ordered collection of resources with unique ids
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResMap {
    resources: IndexMap<ResId, Resource>,
}

impl ResMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Add a resource at the end; fails if its id is already present
    pub fn append(&mut self, resource: Resource) -> Result<()> {
        if self.resources.contains_key(resource.id()) {
            return Err(CoreError::DuplicateResource {
                id: resource.id().to_string(),
            });
        }
        self.resources.insert(resource.id.clone(), resource);
        Ok(())
    }

    /// Append every resource of `other`, preserving its order
    pub fn append_all(&mut self, other: ResMap) -> Result<()> {
        for resource in other {
            self.append(resource)?;
        }
        Ok(())
    }

    pub fn get(&self, id: &ResId) -> Option<&Resource> {
        self.resources.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &ResId> {
        self.resources.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    /// Render as a `---` separated YAML stream
    pub fn to_yaml(&self) -> Result<String> {
        let mut out = String::new();
        for (i, resource) in self.iter().enumerate() {
            if i > 0 {
                out.push_str("---\n");
            }
            out.push_str(&resource.to_yaml()?);
        }
        Ok(out)
    }
}

impl IntoIterator for ResMap {
    type Item = Resource;
    type IntoIter = indexmap::map::IntoValues<ResId, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.into_values()
    }
}

/// Builds resource collections from raw manifests
pub trait ResMapFactory: Send + Sync {
    fn from_bytes(&self, bytes: &[u8]) -> Result<ResMap>;
}

/// Factory for multi-document YAML streams
///
/// - Empty documents (including comment-only ones) are skipped
/// - `List` kinds are expanded into their `items`
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlResMapFactory;

impl YamlResMapFactory {
    pub fn new() -> Self {
        Self
    }
}

impl ResMapFactory for YamlResMapFactory {
    fn from_bytes(&self, bytes: &[u8]) -> Result<ResMap> {
        let mut resmap = ResMap::new();

        for (index, document) in serde_yaml::Deserializer::from_slice(bytes).enumerate() {
            let value = Value::deserialize(document)?;
            if value.is_null() {
                continue;
            }

            for resource in expand_document(index, value)? {
                resmap.append(resource)?;
            }
        }

        Ok(resmap)
    }
}

fn expand_document(index: usize, value: Value) -> Result<Vec<Resource>> {
    let is_list = value
        .get("kind")
        .and_then(Value::as_str)
        .is_some_and(|kind| kind.ends_with("List"));

    if is_list {
        if let Some(Value::Sequence(items)) = value.get("items") {
            return items
                .iter()
                .cloned()
                .map(|item| Resource::from_value(index, item))
                .collect();
        }
    }

    Ok(vec![Resource::from_value(index, value)?])
}
