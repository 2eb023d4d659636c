//! Structured manifest objects and override value trees
//!
//! An [`Object`] is a schema-less tree of string keys to dynamic values. The
//! engine never requires more structure than that; identity accessors
//! (`kind`, `name`, `namespace`) are thin projections over the conventional
//! `kind`, `metadata.name` and `metadata.namespace` fields and are only used
//! for diagnostics.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Override values passed to sources: a tree of string keys to dynamic values.
pub type Values = Map<String, Value>;

/// A single manifest document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Object(Map<String, Value>);

impl Object {
    /// Create an empty object
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing key tree
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Convert a dynamic value into an object.
    ///
    /// Only mappings are valid manifest documents.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(Error::Decode {
                message: format!("expected a mapping, found {}", type_name(&other)),
            }),
        }
    }

    /// The type identifier (`kind`), or an empty string when absent
    pub fn kind(&self) -> &str {
        self.0.get("kind").and_then(Value::as_str).unwrap_or("")
    }

    /// The object name (`metadata.name`), or an empty string when absent
    pub fn name(&self) -> &str {
        self.get_path(&["metadata", "name"])
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// The optional scope (`metadata.namespace`)
    pub fn namespace(&self) -> Option<&str> {
        self.get_path(&["metadata", "namespace"])
            .and_then(Value::as_str)
            .filter(|ns| !ns.is_empty())
    }

    /// Look up a nested value by key path
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.0.get(*first)?;
        for key in rest {
            current = current.as_object()?.get(*key)?;
        }
        Some(current)
    }

    /// Set a nested value by key path, creating intermediate mappings.
    ///
    /// Non-mapping values found along the path are replaced by mappings.
    pub fn set_path(&mut self, path: &[&str], value: Value) {
        set_path(&mut self.0, path, value);
    }

    /// Borrow the underlying key tree
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Mutably borrow the underlying key tree
    pub fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    /// Unwrap into the underlying key tree
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Convert into a dynamic value
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Object {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.namespace() {
            Some(ns) => write!(f, "{} {}/{}", self.kind(), ns, self.name()),
            None => write!(f, "{} {}", self.kind(), self.name()),
        }
    }
}

fn set_path(map: &mut Map<String, Value>, path: &[&str], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut current = map;
    for key in parents {
        let entry = current
            .entry((*key).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        current = match entry {
            Value::Object(inner) => inner,
            _ => return,
        };
    }
    current.insert((*last).to_string(), value);
}

/// Human-readable name of a value's type, for diagnostics
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identity_accessors() {
        let obj = Object::from_value(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {"name": "settings", "namespace": "apps"}
        }))
        .unwrap();

        assert_eq!(obj.kind(), "ConfigMap");
        assert_eq!(obj.name(), "settings");
        assert_eq!(obj.namespace(), Some("apps"));
        assert_eq!(obj.to_string(), "ConfigMap apps/settings");
    }

    #[test]
    fn test_identity_accessors_missing_fields() {
        let obj = Object::from_value(json!({"data": {"k": "v"}})).unwrap();
        assert_eq!(obj.kind(), "");
        assert_eq!(obj.name(), "");
        assert_eq!(obj.namespace(), None);
    }

    #[test]
    fn test_empty_namespace_is_absent() {
        let obj = Object::from_value(json!({
            "kind": "Namespace",
            "metadata": {"name": "apps", "namespace": ""}
        }))
        .unwrap();
        assert_eq!(obj.namespace(), None);
        assert_eq!(obj.to_string(), "Namespace apps");
    }

    #[test]
    fn test_from_value_rejects_non_mapping() {
        let err = Object::from_value(json!(["a", "b"])).unwrap_err();
        assert!(format!("{}", err).contains("expected a mapping, found list"));
    }

    #[test]
    fn test_set_path_creates_and_replaces() {
        let mut obj = Object::from_value(json!({"metadata": "oops"})).unwrap();
        obj.set_path(&["metadata", "labels", "tier"], json!("web"));
        assert_eq!(
            obj.get_path(&["metadata", "labels", "tier"]),
            Some(&json!("web"))
        );
    }
}
