//! The compiler capability and its incremental session.

use crate::error::CompilerError;
use crate::host::CompilerHost;
use crate::options::CompilerOptions;
use crate::types::{EmitOutput, ParsedCommandLine, ResolvedModule, TranspileOutput};
use std::path::Path;
use tsl_config::ProjectConfigFile;
use tsl_diagnostics::Diagnostic;
use tsl_source::{FilePath, FileSystem};

/// A compiler package: configuration parsing, resolution, and sessions.
///
/// Implementations are registered on the engine by [`name`](Compiler::name)
/// and shared by every instance that selects them.
pub trait Compiler: Send + Sync {
    /// The package name the `compiler` option refers to.
    fn name(&self) -> &str;

    /// The package version, for logging.
    fn version(&self) -> &str;

    /// Turns a project configuration into options and root files.
    ///
    /// Invalid options are returned as diagnostics in
    /// [`ParsedCommandLine::errors`]; `Err` means the configuration could not
    /// be interpreted at all.
    fn parse_config(
        &self,
        config: &ProjectConfigFile,
        base_dir: &Path,
        fs: &dyn FileSystem,
    ) -> Result<ParsedCommandLine, CompilerError>;

    /// Starts an incremental session.
    fn create_session(&self, options: &CompilerOptions) -> Box<dyn CompilerSession>;

    /// Resolves an import with the compiler's own algorithm.
    fn resolve_module_name(
        &self,
        name: &str,
        containing: &Path,
        options: &CompilerOptions,
        fs: &dyn FileSystem,
    ) -> Option<ResolvedModule>;

    /// Transpiles one file without type information.
    fn transpile_module(
        &self,
        text: &str,
        file: &FilePath,
        options: &CompilerOptions,
    ) -> TranspileOutput;
}

/// An incremental compilation session.
///
/// A session caches per-file work keyed by
/// [`CompilerHost::script_version`] and rebuilds its program lazily before
/// answering. It is not safe for concurrent use; the engine serializes calls.
pub trait CompilerSession: Send {
    /// Problems with the options themselves, not tied to a file.
    fn options_diagnostics(&mut self, host: &mut dyn CompilerHost) -> Vec<Diagnostic>;

    /// Parse errors in `file`.
    fn syntactic_diagnostics(
        &mut self,
        host: &mut dyn CompilerHost,
        file: &Path,
    ) -> Vec<Diagnostic>;

    /// Type errors in `file`.
    fn semantic_diagnostics(&mut self, host: &mut dyn CompilerHost, file: &Path) -> Vec<Diagnostic>;

    /// Emits `file`.
    fn emit(&mut self, host: &mut dyn CompilerHost, file: &Path) -> EmitOutput;
}
