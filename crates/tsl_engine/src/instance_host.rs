//! The compiler-facing view of one instance.

use crate::graph::{DependencyGraph, ResolvedDependency};
use crate::resolver::ModuleResolver;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tsl_compiler::{CompilerHost, CompilerOptions, ResolvedModule};
use tsl_source::{FilePath, FileSystem, FileTable};

/// Borrows the parts of an instance a compiler session calls back into.
///
/// Every `resolve_module_names` call replaces the containing file's entry in
/// the dependency graph.
pub(crate) struct InstanceHost<'a> {
    pub(crate) files: &'a mut FileTable,
    pub(crate) graph: &'a mut DependencyGraph,
    pub(crate) resolver: &'a ModuleResolver,
    pub(crate) options: &'a CompilerOptions,
    pub(crate) fs: &'a dyn FileSystem,
}

impl CompilerHost for InstanceHost<'_> {
    fn key(&self, path: &Path) -> FilePath {
        self.files.key(path)
    }

    fn root_file_names(&self) -> Vec<PathBuf> {
        self.files
            .root_paths()
            .into_iter()
            .map(|p| p.as_path().to_path_buf())
            .collect()
    }

    fn script_version(&self, path: &Path) -> Option<u64> {
        self.files.version(&self.files.key(path))
    }

    fn script_text(&mut self, path: &Path) -> Option<Arc<str>> {
        let key = self.files.key(path);
        self.files
            .load(self.fs, &key)
            .map(|record| Arc::clone(record.text()))
    }

    fn file_exists(&self, path: &Path) -> bool {
        self.files.contains(&self.files.key(path)) || self.fs.file_exists(path)
    }

    fn read_file(&self, path: &Path) -> Option<String> {
        match self.files.get(&self.files.key(path)) {
            Some(record) => Some(record.text().to_string()),
            None => self.fs.read_file(path),
        }
    }

    fn resolve_module_names(
        &mut self,
        names: &[String],
        containing: &Path,
    ) -> Vec<Option<ResolvedModule>> {
        let results = self
            .resolver
            .resolve_module_names(names, containing, self.options, self.fs);
        let files = &*self.files;
        let edges = results.iter().map(|r| {
            r.as_ref().map(|m| ResolvedDependency {
                resolved: files.key(&m.resolved_file_name),
                original: m.original_file_name.clone(),
                is_external_library_import: m.is_external_library_import,
            })
        });
        self.graph.populate(files.key(containing), edges);
        results
    }

    fn compiler_options(&self) -> &CompilerOptions {
        self.options
    }
}
