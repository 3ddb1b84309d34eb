//! Pluggable message formatting for reported diagnostics.

use crate::code::DiagnosticCode;
use crate::severity::Severity;
use std::path::Path;

/// Everything a formatter needs to render one diagnostic.
///
/// `file` is already relative to the reporter's context directory, and
/// `line`/`character` are 1-based.
#[derive(Debug, Clone, Copy)]
pub struct ErrorInfo<'a> {
    /// Severity of the diagnostic.
    pub severity: Severity,
    /// Compiler code.
    pub code: DiagnosticCode,
    /// Flattened message text.
    pub message: &'a str,
    /// Context-relative file path, if the diagnostic has a file.
    pub file: Option<&'a Path>,
    /// 1-based line, if the diagnostic has a position.
    pub line: Option<u32>,
    /// 1-based character, if the diagnostic has a position.
    pub character: Option<u32>,
}

/// Renders a diagnostic into the message text stored on a [`HostError`](crate::HostError).
pub trait ErrorFormatter: Send + Sync {
    /// Formats one diagnostic.
    fn format(&self, info: &ErrorInfo<'_>) -> String;
}

impl<F> ErrorFormatter for F
where
    F: Fn(&ErrorInfo<'_>) -> String + Send + Sync,
{
    fn format(&self, info: &ErrorInfo<'_>) -> String {
        self(info)
    }
}

/// The default format: `SEVERITY in file(line,col): TScode: text`.
///
/// Produces, depending on how much location is known:
/// ```text
/// ERROR in src/app.ts(3,7): TS2322: Type 'string' is not assignable to type 'number'.
/// ERROR in src/app.ts: TS1208: 'app.ts' cannot be compiled under '--isolatedModules'.
/// ERROR: TS5023: Unknown compiler option 'strictest'.
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFormatter;

impl ErrorFormatter for DefaultFormatter {
    fn format(&self, info: &ErrorInfo<'_>) -> String {
        let mut out = String::from(info.severity.label());
        if let Some(file) = info.file {
            out.push_str(&format!(" in {}", file.display()));
            if let (Some(line), Some(character)) = (info.line, info.character) {
                out.push_str(&format!("({line},{character})"));
            }
        }
        out.push_str(&format!(": {}: {}", info.code, info.message));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info<'a>(file: Option<&'a Path>, pos: Option<(u32, u32)>) -> ErrorInfo<'a> {
        ErrorInfo {
            severity: Severity::Error,
            code: DiagnosticCode(2322),
            message: "Type 'string' is not assignable to type 'number'.",
            file,
            line: pos.map(|p| p.0),
            character: pos.map(|p| p.1),
        }
    }

    #[test]
    fn full_location() {
        let out = DefaultFormatter.format(&info(Some(Path::new("src/app.ts")), Some((3, 7))));
        assert_eq!(
            out,
            "ERROR in src/app.ts(3,7): TS2322: Type 'string' is not assignable to type 'number'."
        );
    }

    #[test]
    fn file_without_position() {
        let out = DefaultFormatter.format(&info(Some(Path::new("src/app.ts")), None));
        assert!(out.starts_with("ERROR in src/app.ts: TS2322:"));
    }

    #[test]
    fn global_diagnostic() {
        let out = DefaultFormatter.format(&info(None, None));
        assert!(out.starts_with("ERROR: TS2322:"));
    }

    #[test]
    fn closures_are_formatters() {
        let f = |i: &ErrorInfo<'_>| format!("{}|{}", i.code, i.line.unwrap_or(0));
        assert_eq!(f.format(&info(None, Some((9, 1)))), "TS2322|9");
    }
}
