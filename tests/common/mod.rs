//! Shared test utilities for integration and E2E tests.
//!
//! Add `mod common;` to a test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! let deploy = object("Deployment", "web");
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use manifest_engine::context::Context;
use manifest_engine::error::{Error, Result};
use manifest_engine::object::{Object, Values};
use manifest_engine::source::{Renderer, Source};
use serde_json::{json, Value};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use super::{object, tree, CountingRenderer, FailingSource};
}

/// A minimal object with kind and name
#[allow(dead_code)]
pub fn object(kind: &str, name: &str) -> Object {
    Object::from_value(json!({"kind": kind, "metadata": {"name": name}})).unwrap()
}

/// Convert a JSON literal mapping into override values
#[allow(dead_code)]
pub fn tree(value: Value) -> Values {
    value.as_object().cloned().unwrap()
}

/// Renderer that emits one ConfigMap per call carrying the values it got,
/// and counts its invocations
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct CountingRenderer {
    pub calls: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl CountingRenderer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Renderer for CountingRenderer {
    fn identity(&self) -> String {
        "counting@1.0.0".to_string()
    }

    fn render(&self, _ctx: &Context, values: &Values) -> Result<Vec<Object>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Object::from_value(json!({
            "kind": "ConfigMap",
            "metadata": {"name": "rendered"},
            "data": Value::Object(values.clone())
        }))
        .map(|obj| vec![obj])
    }
}

/// Source that always fails with a render error
#[allow(dead_code)]
pub struct FailingSource(pub &'static str);

impl Source for FailingSource {
    fn name(&self) -> &str {
        self.0
    }

    fn process(&self, _ctx: &Context, _values: &Values) -> Result<Vec<Object>> {
        Err(Error::Render {
            engine: self.0.to_string(),
            message: "template not found".to_string(),
        })
    }
}
