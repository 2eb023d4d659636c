//! Decoding manifest text into objects and encoding objects back to text
//!
//! YAML streams may hold several documents separated by `---`; every
//! non-empty document becomes one object. JSON input may be a single object
//! or an array of objects.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::object::Object;

/// Output encodings supported by [`encode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Yaml,
    Json,
}

impl Format {
    /// Pick a format from a file extension; anything but `.json` is YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Yaml,
        }
    }
}

/// Whether a path looks like a manifest file
pub fn is_manifest_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml" | "json")
    )
}

/// Split a (possibly multi-document) YAML stream into objects
pub fn decode_yaml(text: &str) -> Result<Vec<Object>> {
    let mut objects = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        let value = Value::deserialize(document)?;
        match value {
            Value::Null => continue,
            Value::Object(map) if map.is_empty() => continue,
            other => objects.push(Object::from_value(other)?),
        }
    }
    Ok(objects)
}

/// Decode a JSON object or array of objects
pub fn decode_json(text: &str) -> Result<Vec<Object>> {
    match serde_json::from_str::<Value>(text)? {
        Value::Array(items) => items.into_iter().map(Object::from_value).collect(),
        Value::Null => Ok(Vec::new()),
        other => Ok(vec![Object::from_value(other)?]),
    }
}

/// Decode text in the given format
pub fn decode(text: &str, format: Format) -> Result<Vec<Object>> {
    match format {
        Format::Yaml => decode_yaml(text),
        Format::Json => decode_json(text),
    }
}

/// Decode a file's content, choosing the format by extension
pub fn decode_file(path: &Path, text: &str) -> Result<Vec<Object>> {
    decode(text, Format::from_path(path)).map_err(|e| Error::Decode {
        message: format!("{}: {}", path.display(), e),
    })
}

/// Encode objects as a YAML stream or a JSON array
pub fn encode(objects: &[Object], format: Format) -> Result<String> {
    match format {
        Format::Yaml => {
            let mut out = String::new();
            for (i, obj) in objects.iter().enumerate() {
                if i > 0 {
                    out.push_str("---\n");
                }
                out.push_str(&serde_yaml::to_string(obj)?);
            }
            Ok(out)
        }
        Format::Json => {
            let mut out = serde_json::to_string_pretty(objects)?;
            out.push('\n');
            Ok(out)
        }
    }
}
