//! Sources that read static manifest files

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;

use super::{validate_name, Source, SourceOptions};
use crate::codec::{decode_file, is_manifest_path};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::filesystem::FileSystem;
use crate::object::{Object, Values};
use crate::pipeline::Pipeline;

/// Which files a [`FileSource`] reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// A single file, or a directory walked recursively for
    /// `.yaml`/`.yml`/`.json` files
    Path(PathBuf),
    /// Every file matching a glob pattern
    Glob(String),
}

impl Location {
    fn is_empty(&self) -> bool {
        match self {
            Location::Path(path) => path.as_os_str().is_empty(),
            Location::Glob(pattern) => pattern.trim().is_empty(),
        }
    }
}

/// Reads static manifests from a [`FileSystem`].
///
/// Files are read in sorted path order and split into one object per YAML
/// document. Override values are ignored.
pub struct FileSource {
    name: String,
    fs: Arc<dyn FileSystem>,
    location: Location,
    pipeline: Pipeline,
}

impl FileSource {
    pub fn new(
        name: impl Into<String>,
        fs: Arc<dyn FileSystem>,
        location: Location,
    ) -> Result<Self> {
        Self::with_options(name, fs, location, SourceOptions::default())
    }

    pub fn with_options(
        name: impl Into<String>,
        fs: Arc<dyn FileSystem>,
        location: Location,
        options: SourceOptions,
    ) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        if location.is_empty() {
            return Err(Error::config(format!("source '{}': path must not be empty", name)));
        }
        Ok(Self {
            name,
            fs,
            location,
            pipeline: options.pipeline,
        })
    }

    /// Resolve the location to a sorted list of files
    fn files(&self) -> Result<Vec<PathBuf>> {
        match &self.location {
            Location::Glob(pattern) => self.fs.glob(pattern),
            Location::Path(path) if self.fs.is_dir(path) => Ok(self
                .fs
                .walk(path)?
                .into_iter()
                .filter(|entry| !entry.is_dir && is_manifest_path(&entry.path))
                .map(|entry| entry.path)
                .collect()),
            Location::Path(path) => Ok(vec![path.clone()]),
        }
    }

    fn read(&self, path: &Path) -> Result<Vec<Object>> {
        let text = self.fs.read_to_string(path)?;
        decode_file(path, &text)
    }
}

impl Source for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, ctx: &Context, _values: &Values) -> Result<Vec<Object>> {
        let mut objects = Vec::new();
        for path in self.files()? {
            ctx.check()?;
            objects.extend(self.read(&path)?);
        }
        debug!("{}: loaded {} objects", self.name, objects.len());
        self.pipeline.apply(ctx, objects)
    }
}
