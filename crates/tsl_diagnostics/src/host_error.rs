//! Error objects handed to the host build.

use crate::code::DiagnosticCode;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A 1-based position range for range-aware hosts.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ErrorLocation {
    /// Start line (1-indexed).
    pub line: u32,
    /// Start character (1-indexed).
    pub character: u32,
    /// End line (1-indexed).
    pub end_line: u32,
    /// End character (1-indexed).
    pub end_character: u32,
}

/// A formatted error or warning as the host build stores it.
///
/// `origin` identifies who produced the error. The reporter only ever removes
/// errors whose origin equals its own, so errors from unrelated tooling in the
/// same module record survive every round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostError {
    /// Severity of the underlying diagnostic.
    pub severity: Severity,
    /// Compiler code, absent for engine-level errors.
    pub code: Option<DiagnosticCode>,
    /// The fully formatted message.
    pub message: String,
    /// The file the error belongs to, if any.
    pub file: Option<PathBuf>,
    /// Position within `file`, if known.
    pub location: Option<ErrorLocation>,
    /// Tag of the producer.
    pub origin: Option<String>,
}

impl HostError {
    /// Creates an untagged error with only a message.
    pub fn message(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            file: None,
            location: None,
            origin: None,
        }
    }

    /// Tags the error with a producer origin.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Returns `true` if this error was produced by `origin`.
    pub fn is_from(&self, origin: &str) -> bool {
        self.origin.as_deref() == Some(origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_tagging() {
        let e = HostError::message(Severity::Error, "boom").with_origin("tsl-default_0");
        assert!(e.is_from("tsl-default_0"));
        assert!(!e.is_from("eslint"));
        assert!(!HostError::message(Severity::Error, "x").is_from("tsl-default_0"));
    }

    #[test]
    fn serde_shape() {
        let e = HostError::message(Severity::Warning, "careful").with_origin("tsl");
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["origin"], "tsl");
    }
}
