//! Structural merge of value trees
//!
//! Layers per-call override values onto a source's static values. The merge
//! is recursive with override-wins semantics:
//!
//! - Mappings present on both sides are merged key by key
//! - Any other combination is decided by the overlay, including type changes
//!   (a mapping can be replaced by a scalar and vice versa)
//! - Lists are replaced wholesale, never concatenated or merged per element
//!
//! Inputs are only ever borrowed, and every value in the result is an owned
//! copy, so the result shares no structure with either input.
//!
//! ## Example
//!
//! ```
//! use manifest_engine::merge::merge;
//! use serde_json::json;
//!
//! let base = json!({"a": 1, "b": {"x": 1, "y": 2}});
//! let overlay = json!({"b": {"y": 9, "z": 3}});
//!
//! let merged = merge(base.as_object(), overlay.as_object());
//! assert_eq!(
//!     serde_json::Value::Object(merged),
//!     json!({"a": 1, "b": {"x": 1, "y": 9, "z": 3}})
//! );
//! ```

use log::trace;
use serde_json::{Map, Value};

use crate::object::{type_name, Values};

/// Merge `overlay` on top of `base`, returning a new tree.
///
/// An absent or empty side yields a copy of the other side; two absent or
/// empty sides yield an empty tree.
pub fn merge(base: Option<&Values>, overlay: Option<&Values>) -> Values {
    let base = base.filter(|m| !m.is_empty());
    let overlay = overlay.filter(|m| !m.is_empty());

    match (base, overlay) {
        (None, None) => Map::new(),
        (Some(base), None) => base.clone(),
        (None, Some(overlay)) => overlay.clone(),
        (Some(base), Some(overlay)) => merge_maps(base, overlay, ""),
    }
}

fn merge_maps(base: &Values, overlay: &Values, path: &str) -> Values {
    let mut result = base.clone();

    for (key, value) in overlay {
        let key_path = if path.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", path, key)
        };

        match (result.get(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                let merged = merge_maps(existing, incoming, &key_path);
                result.insert(key.clone(), Value::Object(merged));
            }
            (Some(existing), incoming) => {
                if std::mem::discriminant(existing) != std::mem::discriminant(incoming) {
                    trace!(
                        "Overriding value at '{}': {} -> {}",
                        key_path,
                        type_name(existing),
                        type_name(incoming)
                    );
                }
                result.insert(key.clone(), incoming.clone());
            }
            (None, incoming) => {
                result.insert(key.clone(), incoming.clone());
            }
        }
    }

    result
}

/// Merge a sequence of layers in order, later layers winning.
pub fn merge_all<'a, I>(layers: I) -> Values
where
    I: IntoIterator<Item = &'a Values>,
{
    layers
        .into_iter()
        .fold(Map::new(), |acc, layer| merge(Some(&acc), Some(layer)))
}
