//! Orchestration engine
//!
//! The [`Engine`] owns an ordered list of [`Source`]s plus engine-level
//! selectors and mutators. Each call to [`Engine::render`]:
//!
//! 1. Appends the call-level selectors and mutators after the engine-level
//!    ones (call-level stages always run last within their stage).
//! 2. Runs every Source with the call's override values, either one after
//!    the other or fanned out over the rayon thread pool.
//! 3. Concatenates the outputs in configured Source order. Any Source
//!    failure aborts the render with an error naming that Source.
//! 4. Filters, then transforms, the combined collection.
//!
//! A failed render never returns partial results. Side effects already
//! performed by Sources that ran (e.g. cache writes) are not rolled back.
//!
//! The engine is immutable once built, so concurrent renders on one engine
//! are safe as long as each Source's `process` is.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, warn};
use rayon::prelude::*;

use crate::context::{Context, NoopObserver, Observer};
use crate::error::{Error, Result};
use crate::object::{Object, Values};
use crate::pipeline::{MutatorRef, Pipeline, SelectorRef};
use crate::source::{validate_name, Source};

/// Per-call selectors, mutators and override values
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pipeline: Pipeline,
    values: Values,
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a call-level selector
    pub fn selector(mut self, selector: SelectorRef) -> Self {
        self.pipeline = self.pipeline.selector(selector);
        self
    }

    /// Append a call-level mutator
    pub fn mutator(mut self, mutator: MutatorRef) -> Self {
        self.pipeline = self.pipeline.mutator(mutator);
        self
    }

    /// Override values merged into every Source's own values
    pub fn values(mut self, values: Values) -> Self {
        self.values = values;
        self
    }
}

/// Builder for [`Engine`]; validation happens in [`EngineBuilder::build`]
#[derive(Default)]
pub struct EngineBuilder {
    sources: Vec<Arc<dyn Source>>,
    pipeline: Pipeline,
    concurrent: bool,
    observer: Option<Arc<dyn Observer>>,
}

impl EngineBuilder {
    /// Append a Source; output order follows registration order
    pub fn source<S: Source + 'static>(mut self, source: S) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    /// Append an already-shared Source
    pub fn shared_source(mut self, source: Arc<dyn Source>) -> Self {
        self.sources.push(source);
        self
    }

    /// Append an engine-level selector
    pub fn selector(mut self, selector: SelectorRef) -> Self {
        self.pipeline = self.pipeline.selector(selector);
        self
    }

    /// Append an engine-level mutator
    pub fn mutator(mut self, mutator: MutatorRef) -> Self {
        self.pipeline = self.pipeline.mutator(mutator);
        self
    }

    /// Run Sources concurrently
    pub fn concurrent(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    /// Receive render and per-Source telemetry
    pub fn observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn build(self) -> Result<Engine> {
        for (index, source) in self.sources.iter().enumerate() {
            validate_name(source.name())
                .map_err(|_| Error::config(format!("source #{} has an empty name", index)))?;
        }
        Ok(Engine {
            sources: self.sources,
            pipeline: self.pipeline,
            concurrent: self.concurrent,
            observer: self.observer.unwrap_or_else(|| Arc::new(NoopObserver)),
        })
    }
}

/// Aggregates Sources and applies the engine pipeline
pub struct Engine {
    sources: Vec<Arc<dyn Source>>,
    pipeline: Pipeline,
    concurrent: bool,
    observer: Arc<dyn Observer>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("sources", &self.source_names())
            .field("pipeline", &self.pipeline)
            .field("concurrent", &self.concurrent)
            .finish()
    }
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Names of the configured Sources, in order
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub fn is_concurrent(&self) -> bool {
        self.concurrent
    }

    /// Run every Source and the combined pipeline once
    pub fn render(&self, ctx: &Context, options: &RenderOptions) -> Result<Vec<Object>> {
        let start = Instant::now();
        let result = self.render_inner(ctx, options);
        let count = result.as_ref().map(Vec::len).unwrap_or(0);
        self.observer.on_render(start.elapsed(), count);

        match &result {
            Ok(objects) => debug!(
                "Rendered {} objects from {} sources in {:?}",
                objects.len(),
                self.sources.len(),
                start.elapsed()
            ),
            Err(e) if matches!(e.root_cause(), Error::Cancelled) => warn!("Render cancelled"),
            Err(e) => warn!("Render failed: {}", e),
        }
        result
    }

    fn render_inner(&self, ctx: &Context, options: &RenderOptions) -> Result<Vec<Object>> {
        let pipeline = self.pipeline.extended(&options.pipeline);

        let outputs = if self.concurrent {
            self.run_concurrent(ctx, &options.values)?
        } else {
            self.run_sequential(ctx, &options.values)?
        };

        let objects: Vec<Object> = outputs.into_iter().flatten().collect();
        pipeline.apply(ctx, objects)
    }

    fn run_sequential(&self, ctx: &Context, values: &Values) -> Result<Vec<Vec<Object>>> {
        self.sources
            .iter()
            .enumerate()
            .map(|(index, source)| self.run_source(ctx, index, source.as_ref(), values))
            .collect()
    }

    /// Fan out over the rayon pool. Results land in per-Source slots, so the
    /// output keeps configured order and the reported error is the failing
    /// Source with the lowest index. Every Source runs to completion.
    fn run_concurrent(&self, ctx: &Context, values: &Values) -> Result<Vec<Vec<Object>>> {
        let results: Vec<Result<Vec<Object>>> = self
            .sources
            .par_iter()
            .enumerate()
            .map(|(index, source)| self.run_source(ctx, index, source.as_ref(), values))
            .collect();

        results.into_iter().collect()
    }

    fn run_source(
        &self,
        ctx: &Context,
        index: usize,
        source: &dyn Source,
        values: &Values,
    ) -> Result<Vec<Object>> {
        let name = source.name();
        let start = Instant::now();

        let result = ctx.check().and_then(|()| source.process(ctx, values));

        let elapsed = start.elapsed();
        match &result {
            Ok(objects) => {
                debug!(
                    "Source #{} ({}) produced {} objects in {:?}",
                    index,
                    name,
                    objects.len(),
                    elapsed
                );
                self.observer.on_source(name, elapsed, objects.len(), None);
            }
            Err(e) => {
                warn!("Source #{} ({}) failed: {}", index, name, e);
                self.observer.on_source(name, elapsed, 0, Some(e));
            }
        }

        result.map_err(|e| Error::for_source(index, name, e))
    }
}
