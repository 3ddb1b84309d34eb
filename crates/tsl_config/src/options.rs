//! Loader options: partial layers and their merged, typed form.

use crate::error::ConfigError;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tsl_source::FileSystem;

/// Name of the optional options file read from the build context.
pub const OPTIONS_FILE_NAME: &str = "tsl.toml";

/// One layer of loader options where every field is optional.
///
/// Layers are produced from `tsl.toml` (under a `[loader]` table) and from
/// host-supplied JSON. Unknown keys are rejected.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoaderOptionsLayer {
    /// Instance name. Builds share an instance when they use the same name.
    pub instance: Option<String>,
    /// Name of the registered compiler to use.
    pub compiler: Option<String>,
    /// Project configuration file: a bare name searched upward, or a path.
    pub config_file: Option<String>,
    /// Skip type checking and transpile each module in isolation.
    pub transpile_only: Option<bool>,
    /// Compiler options applied on top of the configuration file.
    pub compiler_options: Option<Map<String, Value>>,
    /// Diagnostic codes that are never reported.
    pub ignore_diagnostics: Option<Vec<u32>>,
    /// Glob patterns (with `!` negation) restricting which files report.
    pub report_files: Option<Vec<String>>,
    /// Regexes of paths that receive a `.ts` suffix during resolution.
    pub append_ts_suffix_to: Option<Vec<String>>,
    /// Regexes of paths that receive a `.tsx` suffix during resolution.
    pub append_tsx_suffix_to: Option<Vec<String>>,
    /// Honour `references` in the configuration file.
    pub project_references: Option<bool>,
    /// Allow compiling sources that live under `node_modules`.
    pub allow_ts_in_node_modules: Option<bool>,
    /// Only treat modules requested by the bundler as roots.
    pub only_compile_bundled_files: Option<bool>,
    /// Suppress informational logging.
    pub silent: Option<bool>,
    /// Directory error paths are reported relative to.
    pub context: Option<PathBuf>,
    /// Module exporting the custom transformers. The host loads it.
    pub get_custom_transformers: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct OptionsFile {
    #[serde(default)]
    loader: LoaderOptionsLayer,
}

impl LoaderOptionsLayer {
    /// Parses a layer from host-supplied JSON.
    pub fn from_json(value: Value) -> Result<Self, ConfigError> {
        serde_json::from_value(value).map_err(|e| ConfigError::InvalidOptions(e.to_string()))
    }

    /// Parses the `[loader]` table of a `tsl.toml` document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: OptionsFile =
            toml::from_str(content).map_err(|e| ConfigError::InvalidOptions(e.to_string()))?;
        Ok(file.loader)
    }

    /// Reads `<dir>/tsl.toml` through `fs` if it exists.
    pub fn load_from_dir(fs: &dyn FileSystem, dir: &Path) -> Result<Option<Self>, ConfigError> {
        let path = dir.join(OPTIONS_FILE_NAME);
        if !fs.file_exists(&path) {
            return Ok(None);
        }
        let content = fs
            .read_file(&path)
            .ok_or_else(|| ConfigError::Unreadable { path: path.clone() })?;
        tracing::debug!(path = %path.display(), "loaded options file");
        Self::from_toml_str(&content).map(Some)
    }
}

/// Fully merged loader options.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderOptions {
    /// Instance name.
    pub instance: String,
    /// Registered compiler name.
    pub compiler: String,
    /// Configuration file name or path.
    pub config_file: String,
    /// Transpile-only mode.
    pub transpile_only: bool,
    /// Compiler option overrides.
    pub compiler_options: Map<String, Value>,
    /// Ignored diagnostic codes.
    pub ignore_diagnostics: Vec<u32>,
    /// Report-file globs.
    pub report_files: Vec<String>,
    /// `.ts` suffix patterns.
    pub append_ts_suffix_to: Vec<String>,
    /// `.tsx` suffix patterns.
    pub append_tsx_suffix_to: Vec<String>,
    /// Honour project references.
    pub project_references: bool,
    /// Allow `node_modules` sources.
    pub allow_ts_in_node_modules: bool,
    /// Only bundled modules are roots.
    pub only_compile_bundled_files: bool,
    /// Quiet mode.
    pub silent: bool,
    /// Reporting context directory; defaults to the host's root context.
    pub context: Option<PathBuf>,
    /// Path form of `getCustomTransformers`.
    pub get_custom_transformers: Option<String>,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            instance: "default".to_string(),
            compiler: "typescript".to_string(),
            config_file: "tsconfig.json".to_string(),
            transpile_only: false,
            compiler_options: Map::new(),
            ignore_diagnostics: Vec::new(),
            report_files: Vec::new(),
            append_ts_suffix_to: Vec::new(),
            append_tsx_suffix_to: Vec::new(),
            project_references: false,
            allow_ts_in_node_modules: false,
            only_compile_bundled_files: false,
            silent: false,
            context: None,
            get_custom_transformers: None,
        }
    }
}

macro_rules! overlay {
    ($target:expr, $layer:expr, $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = &$layer.$field {
                $target.$field = value.clone();
            }
        )+
    };
}

impl LoaderOptions {
    /// Merges layers over the defaults. Later layers win field by field.
    pub fn resolve(layers: &[LoaderOptionsLayer]) -> Result<Self, ConfigError> {
        let mut options = Self::default();
        for layer in layers {
            overlay!(
                options,
                layer,
                instance,
                compiler,
                config_file,
                transpile_only,
                compiler_options,
                ignore_diagnostics,
                report_files,
                append_ts_suffix_to,
                append_tsx_suffix_to,
                project_references,
                allow_ts_in_node_modules,
                only_compile_bundled_files,
                silent,
            );
            if let Some(context) = &layer.context {
                options.context = Some(context.clone());
            }
            if let Some(module) = &layer.get_custom_transformers {
                options.get_custom_transformers = Some(module.clone());
            }
        }
        options.validate()?;
        Ok(options)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.instance.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "instance name must not be empty".to_string(),
            ));
        }
        if self.compiler.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "compiler name must not be empty".to_string(),
            ));
        }
        if self.config_file.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "configFile must not be empty".to_string(),
            ));
        }
        if self
            .get_custom_transformers
            .as_deref()
            .is_some_and(|m| m.trim().is_empty())
        {
            return Err(ConfigError::ValidationError(
                "getCustomTransformers must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
