//! Compiler diagnostics, host-build error objects, and the diagnostic reporter.
//!
//! The compiler produces [`Diagnostic`] values with 0-based byte spans. The
//! [`DiagnosticReporter`] filters them (ignored codes, report-file globs),
//! formats them through a pluggable [`ErrorFormatter`], tags them with the
//! reporting instance's origin, and routes them into the host build's module
//! records or general error list, replacing whatever that origin reported for
//! the same files in the previous round.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod formatter;
pub mod host_error;
pub mod reporter;
pub mod severity;

pub use code::DiagnosticCode;
pub use diagnostic::Diagnostic;
pub use formatter::{DefaultFormatter, ErrorFormatter, ErrorInfo};
pub use host_error::{ErrorLocation, HostError};
pub use reporter::{DiagnosticReporter, ErrorTarget, ReporterConfig, ReporterError};
pub use severity::Severity;
