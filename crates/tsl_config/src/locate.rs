//! Locating the project configuration file.

use std::path::{Path, PathBuf};
use tsl_source::path::normalize;
use tsl_source::FileSystem;

/// How a `configFile` option value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSpec {
    /// An absolute path, checked as-is.
    Absolute,
    /// Starts with `./` or `../`, resolved against the requesting directory.
    Relative,
    /// A bare file name, searched for upward from the requesting directory.
    Bare,
}

impl ConfigSpec {
    /// Classifies an option value.
    pub fn classify(spec: &str) -> Self {
        if Path::new(spec).is_absolute() {
            Self::Absolute
        } else if ["./", "../", ".\\", "..\\"]
            .iter()
            .any(|prefix| spec.starts_with(prefix))
        {
            Self::Relative
        } else {
            Self::Bare
        }
    }

    /// Returns `true` when the value names one specific file.
    pub fn is_explicit(self) -> bool {
        !matches!(self, Self::Bare)
    }
}

/// Finds the configuration file named by `spec`.
///
/// Explicit paths are checked for existence. Bare names are looked up in
/// `requesting_dir` and each ancestor until the filesystem root.
pub fn find_config_file(fs: &dyn FileSystem, requesting_dir: &Path, spec: &str) -> Option<PathBuf> {
    match ConfigSpec::classify(spec) {
        ConfigSpec::Absolute => {
            let path = normalize(Path::new(spec));
            fs.file_exists(&path).then_some(path)
        }
        ConfigSpec::Relative => {
            let path = normalize(&requesting_dir.join(spec));
            fs.file_exists(&path).then_some(path)
        }
        ConfigSpec::Bare => {
            let mut dir = normalize(requesting_dir);
            loop {
                let candidate = dir.join(spec);
                if fs.file_exists(&candidate) {
                    return Some(candidate);
                }
                match dir.parent() {
                    Some(parent) if parent != dir => dir = parent.to_path_buf(),
                    _ => return None,
                }
            }
        }
    }
}
