//! Sources backed by an external directory-build engine
//!
//! Directory builds read their inputs from a filesystem tree. When a call
//! supplies values, they are serialised to YAML and injected as a synthetic
//! values file at the build path through a [`LayeredFS`], so the builder
//! sees them as an ordinary file while the shared delegate stays untouched.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, trace};

use super::{validate_name, Source, SourceOptions};
use crate::cache::{cache_key, ManifestCache};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::filesystem::{normalize, slash_path, FileSystem, LayeredFS};
use crate::merge::merge;
use crate::object::{Object, Values};
use crate::pipeline::Pipeline;

/// Name of the injected values file, relative to the build path
pub const DEFAULT_VALUES_FILE: &str = "values.yaml";

/// An engine that resolves a directory into raw objects
pub trait Builder: Send + Sync {
    /// Stable identity of the build engine and the tree it reads (e.g. tool
    /// name, version and checkout); combined with the build path and the
    /// effective values to form cache keys
    fn identity(&self) -> String;

    /// Build the directory at `path` inside `fs`
    fn build(&self, ctx: &Context, fs: &dyn FileSystem, path: &Path) -> Result<Vec<Object>>;
}

/// Adapts a [`Builder`] to the [`Source`] contract
pub struct BuildSource<B> {
    name: String,
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
    values_file: String,
    builder: B,
    values: Values,
    pipeline: Pipeline,
    cache: Option<ManifestCache>,
}

impl<B: Builder> BuildSource<B> {
    pub fn new(
        name: impl Into<String>,
        fs: Arc<dyn FileSystem>,
        path: impl Into<PathBuf>,
        builder: B,
    ) -> Result<Self> {
        Self::with_options(name, fs, path, builder, SourceOptions::default())
    }

    pub fn with_options(
        name: impl Into<String>,
        fs: Arc<dyn FileSystem>,
        path: impl Into<PathBuf>,
        builder: B,
        options: SourceOptions,
    ) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(Error::config(format!("source '{}': path must not be empty", name)));
        }
        Ok(Self {
            name,
            fs,
            path,
            values_file: DEFAULT_VALUES_FILE.to_string(),
            builder,
            values: options.values,
            pipeline: options.pipeline,
            cache: options.cache,
        })
    }

    /// Use a different file name for injected values
    pub fn values_file(mut self, file_name: impl Into<String>) -> Result<Self> {
        let file_name = file_name.into();
        if file_name.trim().is_empty() {
            return Err(Error::config(format!(
                "source '{}': values file name must not be empty",
                self.name
            )));
        }
        self.values_file = file_name;
        Ok(self)
    }

    fn build(&self, ctx: &Context, values: &Values) -> Result<Vec<Object>> {
        if values.is_empty() {
            return self.builder.build(ctx, self.fs.as_ref(), &self.path);
        }

        let target = self.path.join(&self.values_file);
        let content = serde_yaml::to_string(values)?;
        trace!("{}: injecting {}", self.name, target.display());
        let layered = LayeredFS::with_overrides(Arc::clone(&self.fs), [(target, content)])?;
        self.builder.build(ctx, &layered, &self.path)
    }

    fn build_cached(&self, ctx: &Context, values: &Values) -> Result<Vec<Object>> {
        let Some(cache) = &self.cache else {
            return self.build(ctx, values);
        };

        let identity = format!(
            "build:{}:{}",
            self.builder.identity(),
            slash_path(&normalize(&self.path))
        );
        let key = cache_key(&identity, values)?;
        if let Some(hit) = cache.get(&key)? {
            trace!("{}: using cached build", self.name);
            return Ok(hit);
        }

        let objects = self.build(ctx, values)?;
        cache.set(key, &objects)?;
        Ok(objects)
    }
}

impl<B: Builder> Source for BuildSource<B> {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, ctx: &Context, values: &Values) -> Result<Vec<Object>> {
        ctx.check()?;
        let effective = merge(Some(&self.values), Some(values));
        let objects = self.build_cached(ctx, &effective)?;
        debug!("{}: built {} objects", self.name, objects.len());
        self.pipeline.apply(ctx, objects)
    }
}
