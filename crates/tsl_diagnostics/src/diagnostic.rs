//! Diagnostics as produced by the compiler.

use crate::code::DiagnosticCode;
use crate::severity::Severity;
use tsl_source::{FilePath, TextSpan};

/// A single compiler diagnostic.
///
/// Recomputed every round and never persisted. Global diagnostics (option or
/// configuration problems) carry no file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The compiler's diagnostic code.
    pub code: DiagnosticCode,
    /// The flattened message text.
    pub message: String,
    /// The file the diagnostic belongs to, if any.
    pub file: Option<FilePath>,
    /// The 0-based byte range within `file`, if known.
    pub span: Option<TextSpan>,
}

impl Diagnostic {
    /// Creates a diagnostic with no location.
    pub fn new(severity: Severity, code: u32, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: DiagnosticCode(code),
            message: message.into(),
            file: None,
            span: None,
        }
    }

    /// Creates an error diagnostic with no location.
    pub fn error(code: u32, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    /// Creates a warning diagnostic with no location.
    pub fn warning(code: u32, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    /// Attaches the diagnostic to a file without a position.
    pub fn in_file(mut self, file: FilePath) -> Self {
        self.file = Some(file);
        self
    }

    /// Attaches the diagnostic to a byte range in a file.
    pub fn at(mut self, file: FilePath, span: TextSpan) -> Self {
        self.file = Some(file);
        self.span = Some(span);
        self
    }
}
