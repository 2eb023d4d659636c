//! Filesystem abstraction for build-style sources
//!
//! Sources that read manifests from disk go through the [`FileSystem`] trait
//! rather than `std::fs`, so a build can run against a real directory
//! ([`OsFS`]), a purely in-memory tree ([`MemoryFS`]), or a read-through
//! overlay that injects synthetic files without touching the real tree
//! ([`LayeredFS`]).
//!
//! ## Paths
//!
//! All paths are logical and relative to the filesystem root. They are
//! normalised before use: `.` components are dropped, `..` pops a component,
//! and a leading `/` is ignored. The root itself is the empty path (or `.`).
//!
//! Glob patterns are matched against the normalised path with `/`
//! separators; `*` does not cross directory boundaries, `**` does.

use std::path::{Component, Path, PathBuf};

use glob::{MatchOptions, Pattern};

use crate::error::Result;

pub mod layered;
pub mod memory;
pub mod os;

pub use layered::LayeredFS;
pub use memory::MemoryFS;
pub use os::OsFS;

/// An entry returned by directory listings and walks
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DirEntry {
    /// Logical path of the entry
    pub path: PathBuf,
    /// Whether the entry is a directory
    pub is_dir: bool,
}

impl DirEntry {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_dir: false,
        }
    }

    pub fn dir(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_dir: true,
        }
    }
}

/// Read, list, glob and walk operations plus additive writes.
///
/// Implementations must be safe to share between threads; writes take
/// `&self` and synchronise internally.
pub trait FileSystem: Send + Sync {
    /// Read the full content of a file
    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Whether a file or directory exists at `path`
    fn exists(&self, path: &Path) -> bool;

    /// Whether `path` is a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Create or replace a file, creating parent directories as needed
    fn write(&self, path: &Path, content: &[u8]) -> Result<()>;

    /// Create a directory and all of its parents
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Immediate children of a directory, sorted by path
    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>>;

    /// Files whose logical path matches `pattern`, sorted
    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>>;

    /// Every file and directory beneath `root` (excluding `root`), sorted
    fn walk(&self, root: &Path) -> Result<Vec<DirEntry>>;

    /// Recursively remove `path` and everything beneath it
    fn remove_all(&self, path: &Path) -> Result<()>;

    /// Read a file as UTF-8 text
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| crate::error::Error::Filesystem {
            message: format!("{} is not valid UTF-8: {}", path.display(), e),
        })
    }
}

/// Normalise a logical path: drop `.` and root components, resolve `..`
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    out
}

/// Render a normalised path with `/` separators for glob matching
pub fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Compile a glob pattern for matching logical paths
pub(crate) fn compile_pattern(pattern: &str) -> Result<Pattern> {
    let trimmed = pattern.trim_start_matches("./").trim_start_matches('/');
    Ok(Pattern::new(trimmed)?)
}

/// Match a compiled pattern against a logical path
pub(crate) fn pattern_matches(pattern: &Pattern, path: &Path) -> bool {
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };
    pattern.matches_with(&slash_path(path), options)
}
