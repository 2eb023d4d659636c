//! In-memory filesystem
//!
//! Files are stored as normalised path → content. Directories exist either
//! explicitly (created with `create_dir_all`) or implicitly as the ancestor
//! of a stored file.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard};

use log::warn;

use super::{compile_pattern, normalize, pattern_matches, DirEntry, FileSystem};
use crate::error::{Error, Result};

#[derive(Debug, Default)]
struct Tree {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
}

impl Tree {
    fn is_dir(&self, path: &Path) -> bool {
        path.as_os_str().is_empty()
            || self.dirs.contains(path)
            || self.files.keys().any(|f| f != path && f.starts_with(path))
    }

    /// Every file and directory strictly beneath `root`
    fn entries_below(&self, root: &Path) -> BTreeMap<PathBuf, bool> {
        let mut entries = BTreeMap::new();
        for file in self.files.keys() {
            if file != root && file.starts_with(root) {
                entries.insert(file.clone(), false);
                add_ancestors(root, file, &mut entries);
            }
        }
        for dir in &self.dirs {
            if dir != root && dir.starts_with(root) {
                entries.insert(dir.clone(), true);
                add_ancestors(root, dir, &mut entries);
            }
        }
        entries
    }
}

/// Record every directory between `root` (exclusive) and `path`
fn add_ancestors(root: &Path, path: &Path, entries: &mut BTreeMap<PathBuf, bool>) {
    let mut parent = path.parent();
    while let Some(dir) = parent {
        if dir == root || !dir.starts_with(root) {
            break;
        }
        entries.insert(dir.to_path_buf(), true);
        parent = dir.parent();
    }
}

/// Thread-safe in-memory filesystem
#[derive(Debug, Default)]
pub struct MemoryFS {
    tree: RwLock<Tree>,
}

fn poisoned() -> Error {
    Error::LockPoisoned {
        context: "memory filesystem".to_string(),
    }
}

impl MemoryFS {
    /// Create a new empty filesystem
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filesystem pre-populated with `(path, content)` pairs
    pub fn with_files<I, P, C>(files: I) -> Result<Self>
    where
        I: IntoIterator<Item = (P, C)>,
        P: AsRef<Path>,
        C: AsRef<[u8]>,
    {
        let fs = Self::new();
        for (path, content) in files {
            fs.write(path.as_ref(), content.as_ref())?;
        }
        Ok(fs)
    }

    /// Add a file with string content
    pub fn add_file_string<P: AsRef<Path>>(&self, path: P, content: &str) -> Result<()> {
        self.write(path.as_ref(), content.as_bytes())
    }

    /// List all files, sorted
    pub fn list_files(&self) -> Result<Vec<PathBuf>> {
        let tree = self.tree.read().map_err(|_| poisoned())?;
        Ok(tree.files.keys().cloned().collect())
    }

    /// Get the number of files
    pub fn len(&self) -> usize {
        self.read_tree().files.len()
    }

    /// Check if filesystem has no files
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MemoryFS {
    /// Read access for the infallible queries. A poisoned lock is logged and
    /// the tree is used as left by the panicking writer.
    fn read_tree(&self) -> RwLockReadGuard<'_, Tree> {
        self.tree.read().unwrap_or_else(|poisoned| {
            warn!("memory filesystem lock poisoned; reading recovered state");
            poisoned.into_inner()
        })
    }
}

impl FileSystem for MemoryFS {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = normalize(path);
        let tree = self.tree.read().map_err(|_| poisoned())?;
        tree.files
            .get(&path)
            .cloned()
            .ok_or_else(|| Error::Filesystem {
                message: format!("File not found: {}", path.display()),
            })
    }

    fn exists(&self, path: &Path) -> bool {
        let path = normalize(path);
        let tree = self.read_tree();
        tree.files.contains_key(&path) || tree.is_dir(&path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        let path = normalize(path);
        self.read_tree().is_dir(&path)
    }

    fn write(&self, path: &Path, content: &[u8]) -> Result<()> {
        let path = normalize(path);
        if path.as_os_str().is_empty() {
            return Err(Error::Filesystem {
                message: "Cannot write to the filesystem root".to_string(),
            });
        }
        let mut tree = self.tree.write().map_err(|_| poisoned())?;
        if tree.is_dir(&path) {
            return Err(Error::Filesystem {
                message: format!("Cannot write file over directory: {}", path.display()),
            });
        }
        tree.files.insert(path, content.to_vec());
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let path = normalize(path);
        let mut tree = self.tree.write().map_err(|_| poisoned())?;
        if tree.files.contains_key(&path) {
            return Err(Error::Filesystem {
                message: format!("A file already exists at {}", path.display()),
            });
        }
        if !path.as_os_str().is_empty() {
            tree.dirs.insert(path);
        }
        Ok(())
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let path = normalize(path);
        let tree = self.tree.read().map_err(|_| poisoned())?;
        if !tree.is_dir(&path) {
            return Err(Error::Filesystem {
                message: format!("Directory not found: {}", path.display()),
            });
        }
        Ok(tree
            .entries_below(&path)
            .into_iter()
            .filter(|(entry, _)| entry.parent() == Some(path.as_path()))
            .map(|(entry, is_dir)| DirEntry {
                path: entry,
                is_dir,
            })
            .collect())
    }

    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let pattern = compile_pattern(pattern)?;
        let tree = self.tree.read().map_err(|_| poisoned())?;
        Ok(tree
            .files
            .keys()
            .filter(|path| pattern_matches(&pattern, path))
            .cloned()
            .collect())
    }

    fn walk(&self, root: &Path) -> Result<Vec<DirEntry>> {
        let root = normalize(root);
        let tree = self.tree.read().map_err(|_| poisoned())?;
        if !tree.is_dir(&root) {
            return Err(Error::Filesystem {
                message: format!("Directory not found: {}", root.display()),
            });
        }
        Ok(tree
            .entries_below(&root)
            .into_iter()
            .map(|(path, is_dir)| DirEntry { path, is_dir })
            .collect())
    }

    fn remove_all(&self, path: &Path) -> Result<()> {
        let path = normalize(path);
        let mut tree = self.tree.write().map_err(|_| poisoned())?;
        tree.files.retain(|f, _| !f.starts_with(&path));
        tree.dirs.retain(|d| !d.starts_with(&path));
        Ok(())
    }
}

#[cfg(test)]
impl MemoryFS {
    /// Panic while holding the write lock
    pub(crate) fn poison(&self) {
        std::thread::scope(|scope| {
            let _ = scope
                .spawn(|| {
                    let _guard = self.tree.write();
                    panic!("writer died");
                })
                .join();
        });
    }
}
