//! Values exchanged with the compiler.

use crate::options::CompilerOptions;
use std::path::{Path, PathBuf};
use tsl_diagnostics::Diagnostic;

/// A successfully resolved import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModule {
    /// The file the compiler analyzes, after suffix rules.
    pub resolved_file_name: PathBuf,
    /// The file the host build bundles.
    pub original_file_name: PathBuf,
    /// Whether the import comes from an external package.
    pub is_external_library_import: bool,
}

impl ResolvedModule {
    /// A resolution whose analyzed and bundled files are the same.
    pub fn new(path: impl Into<PathBuf>, is_external_library_import: bool) -> Self {
        let path = path.into();
        Self {
            resolved_file_name: path.clone(),
            original_file_name: path,
            is_external_library_import,
        }
    }
}

/// The compiler's reading of a project configuration.
#[derive(Debug, Clone, Default)]
pub struct ParsedCommandLine {
    /// Normalized compiler options.
    pub options: CompilerOptions,
    /// Root files listed by the configuration.
    pub file_names: Vec<PathBuf>,
    /// Configuration files of referenced projects.
    pub project_references: Vec<PathBuf>,
    /// Problems found while parsing, such as unknown or invalid options.
    pub errors: Vec<Diagnostic>,
}

/// One file produced by an emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    /// Output path.
    pub name: PathBuf,
    /// Output contents.
    pub text: String,
}

impl OutputFile {
    /// Returns `true` if the output name ends with `suffix`.
    pub fn has_suffix(&self, suffix: &str) -> bool {
        self.name.to_string_lossy().ends_with(suffix)
    }
}

/// Everything emitted for one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmitOutput {
    /// Emitted files.
    pub output_files: Vec<OutputFile>,
    /// `true` if the compiler declined to emit.
    pub emit_skipped: bool,
}

impl EmitOutput {
    /// The emitted JavaScript file, if any.
    pub fn javascript(&self) -> Option<&OutputFile> {
        self.output_files
            .iter()
            .rev()
            .find(|f| [".js", ".jsx", ".mjs", ".cjs"].iter().any(|s| f.has_suffix(s)))
    }

    /// The source map of the emitted JavaScript file, if any.
    pub fn source_map(&self) -> Option<&OutputFile> {
        self.output_files.iter().rev().find(|f| f.has_suffix(".map"))
    }

    /// Emitted declaration files.
    pub fn declarations(&self) -> impl Iterator<Item = &OutputFile> {
        self.output_files
            .iter()
            .filter(|f| tsl_source::path::is_declaration_file(Path::new(&f.name)))
    }
}

/// The result of transpiling one file in isolation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranspileOutput {
    /// Emitted JavaScript, or `None` if nothing could be produced.
    pub output_text: Option<String>,
    /// Source map text, when source maps are enabled.
    pub source_map_text: Option<String>,
    /// Syntactic diagnostics for the file.
    pub diagnostics: Vec<Diagnostic>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> OutputFile {
        OutputFile {
            name: PathBuf::from(name),
            text: String::new(),
        }
    }

    #[test]
    fn finds_outputs_by_extension() {
        let emit = EmitOutput {
            output_files: vec![file("/p/app.js.map"), file("/p/app.js"), file("/p/app.d.ts")],
            emit_skipped: false,
        };
        assert_eq!(emit.javascript().map(|f| f.name.clone()), Some(PathBuf::from("/p/app.js")));
        assert_eq!(
            emit.source_map().map(|f| f.name.clone()),
            Some(PathBuf::from("/p/app.js.map"))
        );
        assert_eq!(emit.declarations().count(), 1);
    }

    #[test]
    fn empty_emit_has_no_javascript() {
        assert!(EmitOutput::default().javascript().is_none());
    }

    #[test]
    fn resolved_module_same_path() {
        let m = ResolvedModule::new("/p/lib.ts", false);
        assert_eq!(m.resolved_file_name, m.original_file_name);
    }
}
