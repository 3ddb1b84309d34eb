//! Internal-error result type for invariant violations inside the engine.

/// The result type for operations that can only fail because of a bug.
///
/// User-facing problems (bad configuration, type errors) have their own error
/// types or are reported as diagnostics; `Err` here means an engine invariant
/// was broken.
pub type TslResult<T> = Result<T, InternalError>;

/// An internal error indicating a bug in the engine, not a user input problem.
#[derive(Debug, thiserror::Error)]
#[error("internal error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
