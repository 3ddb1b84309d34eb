//! The callbacks a compiler session uses to see the engine's files.

use crate::options::CompilerOptions;
use crate::types::ResolvedModule;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tsl_source::FilePath;

/// File access and module resolution as provided by the engine.
///
/// A session must only read program files through this trait so that
/// in-memory edits and versions are honoured.
pub trait CompilerHost {
    /// Builds the engine's key for a path, for attaching diagnostics.
    fn key(&self, path: &Path) -> FilePath;

    /// The program's root files.
    fn root_file_names(&self) -> Vec<PathBuf>;

    /// The current version of a file. Unchanged between edits.
    fn script_version(&self, path: &Path) -> Option<u64>;

    /// The current text of a file, loading it on first reference.
    fn script_text(&mut self, path: &Path) -> Option<Arc<str>>;

    /// Returns `true` if the file is known or exists on disk.
    fn file_exists(&self, path: &Path) -> bool;

    /// Reads a non-program file such as a `package.json`.
    fn read_file(&self, path: &Path) -> Option<String>;

    /// Resolves the imports of `containing`, one result per name.
    ///
    /// Calling this replaces the recorded dependencies of `containing`.
    fn resolve_module_names(
        &mut self,
        names: &[String],
        containing: &Path,
    ) -> Vec<Option<ResolvedModule>>;

    /// The options the program is compiled with.
    fn compiler_options(&self) -> &CompilerOptions;
}
