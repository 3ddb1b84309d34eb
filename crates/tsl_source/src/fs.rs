//! The file-system capability consumed by the file table and resolvers.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// Read-only access to source files.
///
/// The engine never writes to disk; emitted output is handed back to the host.
pub trait FileSystem: Send + Sync {
    /// Reads a file as UTF-8 text, returning `None` if it does not exist or
    /// cannot be read.
    fn read_file(&self, path: &Path) -> Option<String>;

    /// Returns `true` if a regular file exists at `path`.
    fn file_exists(&self, path: &Path) -> bool;

    /// Returns `true` if a directory exists at `path`.
    fn directory_exists(&self, path: &Path) -> bool;
}

/// The real file system, backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn read_file(&self, path: &Path) -> Option<String> {
        match std::fs::read_to_string(path) {
            Ok(text) => Some(text),
            Err(err) => {
                tracing::trace!(path = %path.display(), %err, "read_file failed");
                None
            }
        }
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn directory_exists(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

/// An in-memory file system for hosts that serve files from memory, and for tests.
///
/// Directories exist implicitly as ancestors of stored files.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: RwLock<BTreeMap<PathBuf, String>>,
}

impl MemoryFileSystem {
    /// Creates an empty in-memory file system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a file system pre-populated with `(path, text)` pairs.
    pub fn with_files<P: Into<PathBuf>, T: Into<String>>(
        files: impl IntoIterator<Item = (P, T)>,
    ) -> Self {
        let fs = Self::new();
        for (path, text) in files {
            fs.write(path, text);
        }
        fs
    }

    /// Creates or overwrites a file.
    pub fn write(&self, path: impl Into<PathBuf>, text: impl Into<String>) {
        let mut files = self.files.write().unwrap_or_else(PoisonError::into_inner);
        files.insert(path.into(), text.into());
    }

    /// Removes a file, returning `true` if it existed.
    pub fn remove(&self, path: &Path) -> bool {
        let mut files = self.files.write().unwrap_or_else(PoisonError::into_inner);
        files.remove(path).is_some()
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_file(&self, path: &Path) -> Option<String> {
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        files.get(path).cloned()
    }

    fn file_exists(&self, path: &Path) -> bool {
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        files.contains_key(path)
    }

    fn directory_exists(&self, path: &Path) -> bool {
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        files.keys().any(|f| f != path && f.starts_with(path))
    }
}
