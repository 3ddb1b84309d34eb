//! Errors raised by compiler implementations.

use std::path::PathBuf;

/// A failure of the compiler itself, as opposed to a diagnostic about the
/// user's code.
#[derive(Debug, thiserror::Error)]
pub enum CompilerError {
    /// The configuration could not be turned into a command line.
    #[error("compiler '{compiler}' rejected the configuration: {reason}")]
    InvalidConfig {
        /// Name of the compiler.
        compiler: String,
        /// Why the configuration was rejected.
        reason: String,
    },

    /// The compiler could not read a file it requires.
    #[error("compiler could not read '{}'", path.display())]
    Unreadable {
        /// The file that could not be read.
        path: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_config() {
        let err = CompilerError::InvalidConfig {
            compiler: "typescript".to_string(),
            reason: "'files' must be a list".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "compiler 'typescript' rejected the configuration: 'files' must be a list"
        );
    }
}
