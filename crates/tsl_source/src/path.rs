//! Normalized file paths used as keys throughout the engine.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Component, Path, PathBuf};

/// Whether two paths differing only in letter case name the same file.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseSensitivity {
    /// Paths are compared byte-for-byte (Linux, most Unix file systems).
    #[default]
    Sensitive,
    /// Paths are compared after lowercasing (default macOS and Windows volumes).
    Insensitive,
}

impl CaseSensitivity {
    /// Returns the policy of the platform this process runs on.
    pub fn native() -> Self {
        if cfg!(any(target_os = "windows", target_os = "macos")) {
            CaseSensitivity::Insensitive
        } else {
            CaseSensitivity::Sensitive
        }
    }
}

/// A normalized absolute file path.
///
/// Equality, hashing, and ordering use the comparison key, which is the
/// normalized path lowercased under [`CaseSensitivity::Insensitive`]. The
/// original spelling is kept for display and for reading from disk.
#[derive(Clone, Debug)]
pub struct FilePath {
    path: PathBuf,
    key: String,
}

impl FilePath {
    /// Normalizes `path` lexically and builds its comparison key.
    pub fn new(path: impl AsRef<Path>, case: CaseSensitivity) -> Self {
        let path = normalize(path.as_ref());
        let display = path.to_string_lossy();
        let key = match case {
            CaseSensitivity::Sensitive => display.into_owned(),
            CaseSensitivity::Insensitive => display.to_lowercase(),
        };
        Self { path, key }
    }

    /// Returns the normalized path with its original casing.
    pub fn as_path(&self) -> &Path {
        &self.path
    }

    /// Returns the comparison key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the directory containing this file.
    pub fn parent(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("/"))
    }

    /// Returns `true` for declaration files (`.d.ts`, `.d.mts`, `.d.cts`).
    pub fn is_declaration(&self) -> bool {
        is_declaration_file(&self.path)
    }

    /// Returns `true` if any component of the path is `node_modules`.
    pub fn is_in_node_modules(&self) -> bool {
        self.path
            .components()
            .any(|c| c.as_os_str() == "node_modules")
    }

    /// Returns the file extension as used for script classification.
    ///
    /// Declaration files report their compound extension (`d.ts`, `d.mts`, `d.cts`).
    pub fn script_extension(&self) -> Option<&str> {
        let name = self.path.file_name()?.to_str()?;
        for compound in DECLARATION_EXTENSIONS {
            if name.ends_with(compound) {
                return Some(&compound[1..]);
            }
        }
        self.path.extension()?.to_str()
    }

    /// Returns `true` if this file compiles under `extensions`.
    ///
    /// Declaration files always qualify, whatever compound extension they use.
    pub fn is_script(&self, extensions: &[&str]) -> bool {
        self.is_declaration()
            || self
                .script_extension()
                .is_some_and(|ext| extensions.iter().any(|e| *e == ext))
    }
}

impl PartialEq for FilePath {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for FilePath {}

impl Hash for FilePath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for FilePath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FilePath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Display for FilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

const DECLARATION_EXTENSIONS: [&str; 3] = [".d.ts", ".d.mts", ".d.cts"];

/// Extensions the engine treats as compilable source when `allowJs` is off.
pub const TS_EXTENSIONS: [&str; 7] = ["ts", "tsx", "mts", "cts", "d.ts", "d.mts", "d.cts"];

/// Extensions additionally compilable when `allowJs` is on.
pub const JS_EXTENSIONS: [&str; 4] = ["js", "jsx", "mjs", "cjs"];

/// Returns `true` for declaration files (`.d.ts`, `.d.mts`, `.d.cts`).
pub fn is_declaration_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| DECLARATION_EXTENSIONS.iter().any(|ext| n.ends_with(ext)))
}

/// Lexically normalizes a path: drops `.` components and folds `..` into its parent.
///
/// Does not touch the file system and does not follow symlinks.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                ) && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
