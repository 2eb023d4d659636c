//! Sources backed by an external render engine

use log::{debug, trace};

use super::{validate_name, Source, SourceOptions};
use crate::cache::{cache_key, ManifestCache};
use crate::context::Context;
use crate::error::Result;
use crate::merge::merge;
use crate::object::{Object, Values};
use crate::pipeline::Pipeline;

/// An engine that turns values into raw objects (chart renderer, template
/// engine, ...).
pub trait Renderer: Send + Sync {
    /// Stable logical identity of what is rendered (e.g. chart reference
    /// and version); combined with the effective values to form cache keys
    fn identity(&self) -> String;

    /// Render objects for the given effective values
    fn render(&self, ctx: &Context, values: &Values) -> Result<Vec<Object>>;
}

/// Adapts a [`Renderer`] to the [`Source`] contract.
///
/// Per call: the effective values are the static values with the call's
/// overrides merged on top; the cache (if any) is consulted with a key
/// derived from the renderer identity and those values; on a miss the
/// renderer runs and its raw output is cached; finally the source's own
/// pipeline runs over a private copy.
pub struct RenderSource<R> {
    name: String,
    renderer: R,
    values: Values,
    pipeline: Pipeline,
    cache: Option<ManifestCache>,
}

impl<R: Renderer> RenderSource<R> {
    pub fn new(name: impl Into<String>, renderer: R) -> Result<Self> {
        Self::with_options(name, renderer, SourceOptions::default())
    }

    pub fn with_options(
        name: impl Into<String>,
        renderer: R,
        options: SourceOptions,
    ) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            renderer,
            values: options.values,
            pipeline: options.pipeline,
            cache: options.cache,
        })
    }

    /// The wrapped renderer
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    fn render_cached(&self, ctx: &Context, values: &Values) -> Result<Vec<Object>> {
        let Some(cache) = &self.cache else {
            return self.renderer.render(ctx, values);
        };

        let key = cache_key(&self.renderer.identity(), values)?;
        if let Some(hit) = cache.get(&key)? {
            trace!("{}: using cached render", self.name);
            return Ok(hit);
        }

        let objects = self.renderer.render(ctx, values)?;
        cache.set(key, &objects)?;
        Ok(objects)
    }
}

impl<R: Renderer> Source for RenderSource<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, ctx: &Context, values: &Values) -> Result<Vec<Object>> {
        ctx.check()?;
        let effective = merge(Some(&self.values), Some(values));
        let objects = self.render_cached(ctx, &effective)?;
        debug!("{}: rendered {} objects", self.name, objects.len());
        self.pipeline.apply(ctx, objects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::pipeline::mutator;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Emits one ConfigMap carrying the values it was given
    struct EchoRenderer {
        calls: Arc<AtomicUsize>,
    }

    impl Renderer for EchoRenderer {
        fn identity(&self) -> String {
            "echo@1.0.0".to_string()
        }

        fn render(&self, _ctx: &Context, values: &Values) -> Result<Vec<Object>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let obj = Object::from_value(json!({
                "kind": "ConfigMap",
                "metadata": {"name": "echo"},
                "data": Value::Object(values.clone())
            }))?;
            Ok(vec![obj])
        }
    }

    fn tree(value: Value) -> Values {
        value.as_object().cloned().unwrap()
    }

    fn echo() -> (EchoRenderer, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            EchoRenderer {
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }

    #[test]
    fn test_values_are_merged_with_overrides() {
        let (renderer, _) = echo();
        let options =
            SourceOptions::new().values(tree(json!({"image": {"tag": "1.0", "repo": "nginx"}})));
        let source = RenderSource::with_options("chart", renderer, options).unwrap();

        let result = source
            .process(&Context::new(), &tree(json!({"image": {"tag": "2.0"}})))
            .unwrap();

        assert_eq!(
            result[0].get_path(&["data", "image"]),
            Some(&json!({"tag": "2.0", "repo": "nginx"}))
        );
    }

    #[test]
    fn test_cache_hit_skips_render() {
        let (renderer, calls) = echo();
        let cache = ManifestCache::new(Duration::from_secs(60));
        let source = RenderSource::with_options(
            "chart",
            renderer,
            SourceOptions::new().cache(cache.clone()),
        )
        .unwrap();
        let ctx = Context::new();
        let values = tree(json!({"replicas": 2}));

        source.process(&ctx, &values).unwrap();
        source.process(&ctx, &values).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        source.process(&ctx, &tree(json!({"replicas": 3}))).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len().unwrap(), 2);
    }

    #[test]
    fn test_source_pipeline_does_not_pollute_cache() {
        let (renderer, _) = echo();
        let cache = ManifestCache::new(Duration::from_secs(60));
        let annotate = mutator(|_, mut o: Object| {
            o.set_path(&["metadata", "annotations", "seen"], json!("yes"));
            Ok(o)
        });
        let source = RenderSource::with_options(
            "chart",
            renderer,
            SourceOptions::new().cache(cache.clone()).mutator(annotate),
        )
        .unwrap();
        let ctx = Context::new();

        let mut first = source.process(&ctx, &Values::new()).unwrap();
        first[0].set_path(&["metadata", "name"], json!("mutated-by-caller"));
        let second = source.process(&ctx, &Values::new()).unwrap();

        assert_eq!(second[0].name(), "echo");
        let key = cache_key("echo@1.0.0", &Values::new()).unwrap();
        let cached = cache.get(&key).unwrap().unwrap();
        assert_eq!(cached[0].get_path(&["metadata", "annotations"]), None);
    }

    #[test]
    fn test_render_error_propagates_and_is_not_cached() {
        struct Failing;
        impl Renderer for Failing {
            fn identity(&self) -> String {
                "failing".to_string()
            }
            fn render(&self, _ctx: &Context, _values: &Values) -> Result<Vec<Object>> {
                Err(Error::Render {
                    engine: "failing".to_string(),
                    message: "template error".to_string(),
                })
            }
        }

        let cache = ManifestCache::new(Duration::from_secs(60));
        let source =
            RenderSource::with_options("bad", Failing, SourceOptions::new().cache(cache.clone()))
                .unwrap();
        let err = source.process(&Context::new(), &Values::new()).unwrap_err();
        assert!(matches!(err, Error::Render { .. }));
        assert!(cache.is_empty().unwrap());
    }

    #[test]
    fn test_cancelled_context_skips_render() {
        let (renderer, calls) = echo();
        let source = RenderSource::new("chart", renderer).unwrap();
        let ctx = Context::new();
        ctx.cancel();
        assert!(matches!(
            source.process(&ctx, &Values::new()),
            Err(Error::Cancelled)
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
