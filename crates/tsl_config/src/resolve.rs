//! Combining the located configuration file with loader options.

use crate::error::ConfigError;
use crate::locate::{find_config_file, ConfigSpec};
use crate::options::LoaderOptions;
use crate::project::{parse_project_config, ProjectConfigFile};
use std::path::{Path, PathBuf};
use tsl_source::FileSystem;

/// The project configuration an instance is created from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// The configuration file that was used, if one was found.
    pub config_file_path: Option<PathBuf>,
    /// File contents with the host's compiler-option overrides applied.
    pub config: ProjectConfigFile,
}

impl ResolvedConfig {
    /// Directory relative paths in the configuration are resolved against.
    pub fn base_dir(&self, requesting_dir: &Path) -> PathBuf {
        self.config_file_path
            .as_deref()
            .and_then(Path::parent)
            .map_or_else(|| requesting_dir.to_path_buf(), Path::to_path_buf)
    }
}

/// Locates, reads, and parses the project configuration for `options`.
///
/// A bare `configFile` name that is not found anywhere upward yields an
/// empty configuration. An explicit path that does not exist is an error.
/// Host compiler options replace file-declared options key by key, and
/// `references` are dropped unless `projectReferences` is on.
#[tracing::instrument(skip_all, fields(config_file = %options.config_file))]
pub fn resolve_config(
    fs: &dyn FileSystem,
    options: &LoaderOptions,
    requesting_dir: &Path,
) -> Result<ResolvedConfig, ConfigError> {
    let spec = options.config_file.as_str();
    let found = find_config_file(fs, requesting_dir, spec);

    let (config_file_path, mut config) = match found {
        Some(path) => {
            let text = fs
                .read_file(&path)
                .ok_or_else(|| ConfigError::Unreadable { path: path.clone() })?;
            let config = parse_project_config(&text, &path)?;
            tracing::debug!(path = %path.display(), "using configuration file");
            (Some(path), config)
        }
        None if ConfigSpec::classify(spec).is_explicit() => {
            let path = if Path::new(spec).is_absolute() {
                PathBuf::from(spec)
            } else {
                requesting_dir.join(spec)
            };
            return Err(ConfigError::NotFound { path });
        }
        None => {
            tracing::debug!("no configuration file found, using empty configuration");
            (None, ProjectConfigFile::empty())
        }
    };

    for (key, value) in &options.compiler_options {
        config.compiler_options.insert(key.clone(), value.clone());
    }
    if !options.project_references {
        config.references.clear();
    }

    Ok(ResolvedConfig {
        config_file_path,
        config,
    })
}
