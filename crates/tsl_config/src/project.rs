//! The raw shape of a project configuration file (`tsconfig.json`).

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// A project configuration file as written on disk.
///
/// Only the top-level structure is interpreted here. Individual compiler
/// options are validated by the compiler when it parses the configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfigFile {
    /// Compiler options keyed by their option name.
    #[serde(default)]
    pub compiler_options: Map<String, Value>,
    /// Explicit root files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
    /// Include globs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<String>>,
    /// Exclude globs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,
    /// Referenced sub-projects.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<ProjectReference>,
    /// A base configuration this one extends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
}

/// One entry of `references`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectReference {
    /// Path to the referenced project directory or configuration file.
    pub path: String,
    /// Whether the referenced output is prepended.
    #[serde(default)]
    pub prepend: bool,
}

impl ProjectConfigFile {
    /// The configuration used when no file is found: no options, no files.
    pub fn empty() -> Self {
        Self {
            files: Some(Vec::new()),
            ..Self::default()
        }
    }
}

/// Parses configuration text. Comments and trailing commas are accepted.
pub fn parse_project_config(text: &str, path: &Path) -> Result<ProjectConfigFile, ConfigError> {
    if text.trim().is_empty() {
        return Ok(ProjectConfigFile::default());
    }
    serde_json_lenient::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
