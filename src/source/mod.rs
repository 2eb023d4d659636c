//! Manifest-producing sources
//!
//! A [`Source`] turns a context and a set of override values into a list of
//! objects. The engine treats every source the same way; what differs is
//! where the objects come from:
//!
//! - [`ObjectSource`]: a fixed in-memory list
//! - [`FileSource`]: static YAML/JSON files read through a [`FileSystem`]
//! - [`RenderSource`]: an external render engine (charts, templates) fed
//!   with merged values, optionally memoised in a [`ManifestCache`]
//! - [`BuildSource`]: an external directory-build engine that sees the
//!   merged values as a synthetic file injected through a [`LayeredFS`]
//!
//! Every source validates its configuration when constructed and applies
//! its own [`Pipeline`] before handing objects to the engine.
//!
//! [`FileSystem`]: crate::filesystem::FileSystem
//! [`LayeredFS`]: crate::filesystem::LayeredFS

use crate::cache::ManifestCache;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::object::{Object, Values};
use crate::pipeline::{MutatorRef, Pipeline, SelectorRef};

pub mod build;
pub mod file;
pub mod render;

pub use build::{BuildSource, Builder};
pub use file::{FileSource, Location};
pub use render::{RenderSource, Renderer};

/// A named producer of objects.
///
/// `process` may be called concurrently from several renders.
pub trait Source: Send + Sync {
    /// Non-empty name used in diagnostics and telemetry
    fn name(&self) -> &str;

    /// Produce this source's objects for one render
    fn process(&self, ctx: &Context, values: &Values) -> Result<Vec<Object>>;
}

/// Reject empty or whitespace-only source names
pub(crate) fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::config("source name must not be empty"));
    }
    Ok(())
}

/// Settings shared by the stock sources
#[derive(Debug, Clone, Default)]
pub struct SourceOptions {
    pub(crate) values: Values,
    pub(crate) pipeline: Pipeline,
    pub(crate) cache: Option<ManifestCache>,
}

impl SourceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Static values that call-level overrides are merged onto
    pub fn values(mut self, values: Values) -> Self {
        self.values = values;
        self
    }

    /// Append a source-local selector
    pub fn selector(mut self, selector: SelectorRef) -> Self {
        self.pipeline = self.pipeline.selector(selector);
        self
    }

    /// Append a source-local mutator
    pub fn mutator(mut self, mutator: MutatorRef) -> Self {
        self.pipeline = self.pipeline.mutator(mutator);
        self
    }

    /// Memoise raw engine output in `cache`
    pub fn cache(mut self, cache: ManifestCache) -> Self {
        self.cache = Some(cache);
        self
    }
}

/// A source that returns a fixed list of objects
#[derive(Debug, Clone)]
pub struct ObjectSource {
    name: String,
    objects: Vec<Object>,
    pipeline: Pipeline,
}

impl ObjectSource {
    pub fn new(name: impl Into<String>, objects: Vec<Object>) -> Result<Self> {
        Self::with_options(name, objects, SourceOptions::default())
    }

    /// Values and cache settings are ignored; only the pipeline applies
    pub fn with_options(
        name: impl Into<String>,
        objects: Vec<Object>,
        options: SourceOptions,
    ) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            objects,
            pipeline: options.pipeline,
        })
    }
}

impl Source for ObjectSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, ctx: &Context, _values: &Values) -> Result<Vec<Object>> {
        ctx.check()?;
        self.pipeline.apply(ctx, self.objects.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{mutator, selector};
    use serde_json::json;

    fn obj(kind: &str, name: &str) -> Object {
        Object::from_value(json!({"kind": kind, "metadata": {"name": name}})).unwrap()
    }

    #[test]
    fn test_empty_name_is_config_error() {
        assert!(matches!(
            ObjectSource::new("", vec![]),
            Err(Error::Config { .. })
        ));
        assert!(matches!(
            ObjectSource::new("   ", vec![]),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_object_source_returns_copies() {
        let source = ObjectSource::new("static", vec![obj("A", "a")]).unwrap();
        let ctx = Context::new();

        let mut first = source.process(&ctx, &Values::new()).unwrap();
        first[0].set_path(&["metadata", "name"], json!("changed"));

        assert_eq!(source.process(&ctx, &Values::new()).unwrap(), vec![obj("A", "a")]);
        assert_eq!(source.name(), "static");
    }

    #[test]
    fn test_object_source_applies_own_pipeline() {
        let options = SourceOptions::new()
            .selector(selector(|_, o: &Object| Ok(o.kind() != "Secret")))
            .mutator(mutator(|_, mut o: Object| {
                o.set_path(&["metadata", "labels", "source"], json!("static"));
                Ok(o)
            }));
        let source = ObjectSource::with_options(
            "static",
            vec![obj("Secret", "s"), obj("ConfigMap", "c")],
            options,
        )
        .unwrap();

        let result = source.process(&Context::new(), &Values::new()).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(
            result[0].get_path(&["metadata", "labels", "source"]),
            Some(&json!("static"))
        );
    }
}
