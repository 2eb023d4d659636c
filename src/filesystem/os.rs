//! Real filesystem rooted at a directory

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{compile_pattern, normalize, pattern_matches, DirEntry, FileSystem};
use crate::error::{Error, Result};

/// A [`FileSystem`] backed by the host filesystem beneath `root`.
///
/// Logical paths are normalised before being joined to the root, so they
/// cannot escape it.
#[derive(Debug, Clone)]
pub struct OsFS {
    root: PathBuf,
}

impl OsFS {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory all logical paths are resolved against
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(normalize(path))
    }

    /// Convert a host path beneath the root back to a logical path
    fn logical(&self, host: &Path) -> Result<PathBuf> {
        host.strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .map_err(|_| Error::Filesystem {
                message: format!(
                    "{} is outside {}",
                    host.display(),
                    self.root.display()
                ),
            })
    }
}

impl FileSystem for OsFS {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        Ok(fs::read(self.resolve(path))?)
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.resolve(path).is_dir()
    }

    fn write(&self, path: &Path, content: &[u8]) -> Result<()> {
        let target = self.resolve(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(target, content)?;
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(self.resolve(path))?;
        Ok(())
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let logical_dir = normalize(path);
        let mut entries = Vec::new();
        for entry in fs::read_dir(self.resolve(path))? {
            let entry = entry?;
            entries.push(DirEntry {
                path: logical_dir.join(entry.file_name()),
                is_dir: entry.file_type()?.is_dir(),
            });
        }
        entries.sort();
        Ok(entries)
    }

    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let pattern = compile_pattern(pattern)?;
        let mut matches = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let logical = self.logical(entry.path())?;
            if pattern_matches(&pattern, &logical) {
                matches.push(logical);
            }
        }
        matches.sort();
        Ok(matches)
    }

    fn walk(&self, root: &Path) -> Result<Vec<DirEntry>> {
        let start = self.resolve(root);
        if !start.is_dir() {
            return Err(Error::Filesystem {
                message: format!("Directory not found: {}", normalize(root).display()),
            });
        }
        let mut entries = Vec::new();
        for entry in WalkDir::new(&start).min_depth(1) {
            let entry = entry?;
            entries.push(DirEntry {
                path: self.logical(entry.path())?,
                is_dir: entry.file_type().is_dir(),
            });
        }
        entries.sort();
        Ok(entries)
    }

    fn remove_all(&self, path: &Path) -> Result<()> {
        let target = self.resolve(path);
        if target == self.root {
            return Err(Error::Unsupported {
                operation: format!("remove_all on filesystem root {}", self.root.display()),
            });
        }
        if target.is_dir() {
            fs::remove_dir_all(target)?;
        } else if target.exists() {
            fs::remove_file(target)?;
        }
        Ok(())
    }
}
