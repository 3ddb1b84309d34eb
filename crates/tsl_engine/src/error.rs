//! Fatal errors surfaced by the entry points.

use std::path::PathBuf;
use tsl_common::InternalError;
use tsl_compiler::CompilerError;
use tsl_config::ConfigError;
use tsl_diagnostics::{HostError, ReporterError, Severity};

/// Errors that stop processing of a file or creation of an instance.
///
/// Per-file compiler diagnostics are never represented here; they are
/// reported through the host's error lists.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Loader options or the project configuration are unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The compiler failed while bootstrapping the instance.
    #[error(transparent)]
    Compiler(#[from] CompilerError),

    /// A `reportFiles` pattern is invalid.
    #[error(transparent)]
    Reporter(#[from] ReporterError),

    /// No compiler is registered under the configured name.
    #[error("could not load compiler '{name}': no compiler with that name is registered")]
    CompilerNotFound {
        /// The configured compiler name.
        name: String,
    },

    /// The compiler reported errors while parsing the configuration.
    #[error("error while parsing {}: {message}", config_display(path))]
    InvalidConfig {
        /// The configuration file, if one was found.
        path: Option<PathBuf>,
        /// The compiler's messages, one per line.
        message: String,
    },

    /// A file listed by the configuration does not exist.
    #[error("the file '{}' listed in the configuration does not exist", path.display())]
    MissingFile {
        /// The missing file.
        path: PathBuf,
    },

    /// The compiler produced no output for a file that must emit.
    #[error("no output was emitted for '{}'. {hint}", path.display())]
    NoOutput {
        /// The processed file.
        path: PathBuf,
        /// What the user can do about it.
        hint: String,
    },

    /// An engine invariant was violated.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

fn config_display(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None => "the compiler options".to_string(),
    }
}

impl EngineError {
    /// Converts the error into the single host error shown to the user.
    pub fn to_host_error(&self) -> HostError {
        let mut error = HostError::message(Severity::Error, self.to_string());
        error.file = match self {
            EngineError::MissingFile { path } | EngineError::NoOutput { path, .. } => {
                Some(path.clone())
            }
            EngineError::InvalidConfig { path, .. } => path.clone(),
            _ => None,
        };
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiler_not_found_names_package() {
        let err = EngineError::CompilerNotFound {
            name: "typescript".to_string(),
        };
        let host = err.to_host_error();
        assert_eq!(host.severity, Severity::Error);
        assert!(host.message.contains("'typescript'"));
        assert!(host.file.is_none());
    }

    #[test]
    fn no_output_carries_file_and_hint() {
        let err = EngineError::NoOutput {
            path: PathBuf::from("/p/node_modules/x/index.ts"),
            hint: "Set allowTsInNodeModules to compile it.".to_string(),
        };
        let host = err.to_host_error();
        assert_eq!(host.file, Some(PathBuf::from("/p/node_modules/x/index.ts")));
        assert!(host.message.ends_with("Set allowTsInNodeModules to compile it."));
    }

    #[test]
    fn config_errors_are_transparent() {
        let err = EngineError::from(ConfigError::NotFound {
            path: PathBuf::from("/p/tsconfig.app.json"),
        });
        assert_eq!(
            err.to_host_error().message,
            "the configuration file '/p/tsconfig.app.json' does not exist"
        );
    }

    #[test]
    fn internal_errors_have_no_file() {
        let err = EngineError::from(InternalError::new("no file record for /p/app.ts"));
        let host = err.to_host_error();
        assert_eq!(host.message, "internal error: no file record for /p/app.ts");
        assert!(host.file.is_none());
    }

    #[test]
    fn invalid_config_without_file() {
        let err = EngineError::InvalidConfig {
            path: None,
            message: "Unknown compiler option 'strictest'.".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "error while parsing the compiler options: Unknown compiler option 'strictest'."
        );
    }
}
