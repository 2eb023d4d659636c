//! Read-through overlay filesystem
//!
//! [`LayeredFS`] puts an in-memory layer in front of a delegate filesystem.
//! Reads consult the memory layer first and fall through to the delegate;
//! writes and directory creation only ever touch the memory layer. Listings,
//! globs and walks return the union of both layers, with the memory layer's
//! entry winning when a path exists in both.
//!
//! The overlay is additive only: `remove_all` always fails, and nothing is
//! ever written back to the delegate. Builds sharing one delegate can each
//! inject their own synthetic files without interfering with each other and
//! without a cleanup step.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::trace;

use super::{DirEntry, FileSystem, MemoryFS};
use crate::error::{Error, Result};

/// Memory layer over a shared delegate
pub struct LayeredFS {
    delegate: Arc<dyn FileSystem>,
    memory: MemoryFS,
}

impl std::fmt::Debug for LayeredFS {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayeredFS")
            .field("memory", &self.memory)
            .finish_non_exhaustive()
    }
}

impl LayeredFS {
    /// Create an overlay with an empty memory layer
    pub fn new(delegate: Arc<dyn FileSystem>) -> Self {
        Self {
            delegate,
            memory: MemoryFS::new(),
        }
    }

    /// Create an overlay whose memory layer starts with `overrides`
    pub fn with_overrides<I, P, C>(delegate: Arc<dyn FileSystem>, overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = (P, C)>,
        P: AsRef<Path>,
        C: AsRef<[u8]>,
    {
        Ok(Self {
            delegate,
            memory: MemoryFS::with_files(overrides)?,
        })
    }

    /// Paths held in the memory layer
    pub fn overlay_files(&self) -> Result<Vec<PathBuf>> {
        self.memory.list_files()
    }

    /// Merge two entry lists, memory entries replacing delegate entries
    fn union(delegate: Vec<DirEntry>, memory: Vec<DirEntry>) -> Vec<DirEntry> {
        let mut merged: BTreeMap<PathBuf, bool> = delegate
            .into_iter()
            .map(|entry| (entry.path, entry.is_dir))
            .collect();
        for entry in memory {
            merged.insert(entry.path, entry.is_dir);
        }
        merged
            .into_iter()
            .map(|(path, is_dir)| DirEntry { path, is_dir })
            .collect()
    }

    /// Run a listing against both layers, tolerating a layer that lacks the directory
    fn list_both<F>(&self, path: &Path, list: F) -> Result<Vec<DirEntry>>
    where
        F: Fn(&dyn FileSystem, &Path) -> Result<Vec<DirEntry>>,
    {
        let in_memory = self.memory.is_dir(path);
        let in_delegate = self.delegate.is_dir(path);

        match (in_memory, in_delegate) {
            (false, false) => list(self.delegate.as_ref(), path),
            (true, false) => list(&self.memory, path),
            (false, true) => list(self.delegate.as_ref(), path),
            (true, true) => Ok(Self::union(
                list(self.delegate.as_ref(), path)?,
                list(&self.memory, path)?,
            )),
        }
    }
}

impl FileSystem for LayeredFS {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        if self.memory.exists(path) && !self.memory.is_dir(path) {
            trace!("overlay read: {}", path.display());
            return self.memory.read(path);
        }
        self.delegate.read(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.memory.exists(path) || self.delegate.exists(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.memory.is_dir(path) || self.delegate.is_dir(path)
    }

    fn write(&self, path: &Path, content: &[u8]) -> Result<()> {
        trace!("overlay write: {}", path.display());
        self.memory.write(path, content)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.memory.create_dir_all(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        self.list_both(path, |fs, p| fs.read_dir(p))
    }

    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let mut matches = self.delegate.glob(pattern)?;
        matches.extend(self.memory.glob(pattern)?);
        matches.sort();
        matches.dedup();
        Ok(matches)
    }

    fn walk(&self, root: &Path) -> Result<Vec<DirEntry>> {
        self.list_both(root, |fs, p| fs.walk(p))
    }

    fn remove_all(&self, path: &Path) -> Result<()> {
        Err(Error::Unsupported {
            operation: format!(
                "remove_all({}) on an additive-only layered filesystem",
                path.display()
            ),
        })
    }
}
