//! Error types for option loading and configuration resolution.

use std::path::PathBuf;

/// Errors that abort instance creation because the configuration is unusable.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An explicitly configured project configuration file does not exist.
    #[error("the configuration file '{}' does not exist", path.display())]
    NotFound {
        /// The path that was looked up.
        path: PathBuf,
    },

    /// A located configuration file could not be read.
    #[error("the configuration file '{}' could not be read", path.display())]
    Unreadable {
        /// The path of the configuration file.
        path: PathBuf,
    },

    /// The project configuration file is not valid JSON (with comments).
    #[error("failed to parse {}: {reason}", path.display())]
    ParseError {
        /// The configuration file.
        path: PathBuf,
        /// Description of the parse failure.
        reason: String,
    },

    /// A loader option layer has an unknown key or a value of the wrong type.
    #[error("invalid loader options: {0}")]
    InvalidOptions(String),

    /// A regular expression in a suffix option does not compile.
    #[error("invalid {option} pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The option the pattern belongs to.
        option: &'static str,
        /// The offending pattern.
        pattern: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),
}
