//! The per-file entry point.

use crate::error::EngineError;
use crate::host::LoaderHost;
use crate::instance::CompilerInstance;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tsl_source::FilePath;

const NODE_MODULES_HINT: &str = "Sources under node_modules are not compiled by default. \
     Set allowTsInNodeModules to compile them.";

/// The result of processing one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoaderOutput {
    /// Emitted JavaScript with the source map comment removed.
    pub text: String,
    /// Source map text, when source maps are enabled.
    pub source_map: Option<String>,
    /// Files the processed file depends on, as registered with the host.
    pub dependencies: Vec<PathBuf>,
    /// `path@version` for every dependency the instance has text for.
    pub definition_file_versions: Vec<String>,
}

impl CompilerInstance {
    /// Updates the file table with `text` and returns the emitted output.
    ///
    /// In transpile-only mode the file is transpiled on its own and its
    /// syntactic diagnostics replace this instance's errors on the current
    /// module. Otherwise the file is emitted through the incremental session
    /// and type errors are left to the next round.
    pub fn process_file(
        &mut self,
        host: &mut dyn LoaderHost,
        file: &FilePath,
        text: &str,
    ) -> Result<LoaderOutput, EngineError> {
        if file.is_in_node_modules()
            && !file.is_declaration()
            && !self.loader_options.allow_ts_in_node_modules
        {
            return Err(EngineError::NoOutput {
                path: file.as_path().to_path_buf(),
                hint: NODE_MODULES_HINT.to_string(),
            });
        }

        let update = self.update_file(file, text);
        self.files.mark_root(file);
        let version = self.files.record(file)?.version();
        tracing::trace!(file = %file, version, ?update, "processing file");

        if self.loader_options.transpile_only {
            return self.transpile(host, file, text);
        }

        let output = self.emit_file(file);
        let javascript = match output.javascript() {
            Some(js) if !output.emit_skipped => js,
            _ => {
                return Err(EngineError::NoOutput {
                    path: file.as_path().to_path_buf(),
                    hint: self.no_output_hint(),
                })
            }
        };
        let text = self.after_emit(file, strip_source_mapping_url(&javascript.text));
        let source_map = output.source_map().map(|m| m.text.clone());
        let (dependencies, definition_file_versions) = self.declare_dependencies(host, file);

        Ok(LoaderOutput {
            text,
            source_map,
            dependencies,
            definition_file_versions,
        })
    }

    fn transpile(
        &mut self,
        host: &mut dyn LoaderHost,
        file: &FilePath,
        text: &str,
    ) -> Result<LoaderOutput, EngineError> {
        let output = self
            .compiler
            .transpile_module(text, file, &self.compiler_options);
        let errors = self.reporter.format(&output.diagnostics, &self.files);
        self.reporter.replace_module_errors(host.module_errors(), errors);

        let Some(emitted) = output.output_text else {
            return Err(EngineError::NoOutput {
                path: file.as_path().to_path_buf(),
                hint: "The compiler could not transpile the file in isolation.".to_string(),
            });
        };
        Ok(LoaderOutput {
            text: self.after_emit(file, strip_source_mapping_url(&emitted)),
            source_map: output.source_map_text,
            dependencies: Vec::new(),
            definition_file_versions: Vec::new(),
        })
    }

    fn after_emit(&self, file: &FilePath, javascript: String) -> String {
        match &self.transformers {
            Some(transformers) => transformers.after_emit(file.as_path(), javascript),
            None => javascript,
        }
    }

    fn no_output_hint(&self) -> String {
        if self.compiler_options.no_emit() {
            "The noEmit compiler option is set.".to_string()
        } else {
            "The file may be excluded by the configuration or be a declaration file.".to_string()
        }
    }

    /// Registers the file's resolved imports and every known declaration file.
    fn declare_dependencies(
        &self,
        host: &mut dyn LoaderHost,
        file: &FilePath,
    ) -> (Vec<PathBuf>, Vec<String>) {
        let mut declared: BTreeMap<PathBuf, Option<u64>> = BTreeMap::new();
        for dep in self.graph.dependencies_of(file) {
            declared.insert(dep.original.clone(), self.files.version(&dep.resolved));
        }
        for record in self.files.iter() {
            if record.path().is_declaration() && record.path() != file {
                declared.insert(record.path().as_path().to_path_buf(), Some(record.version()));
            }
        }

        let mut versions = Vec::new();
        for (path, version) in &declared {
            host.add_dependency(path);
            if let Some(version) = version {
                versions.push(format!("{}@{version}", path.display()));
            }
        }
        (declared.into_keys().collect(), versions)
    }
}

fn strip_source_mapping_url(text: &str) -> String {
    text.split_inclusive('\n')
        .filter(|line| !line.starts_with("//# sourceMappingURL="))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_source_mapping_comment() {
        let text = "\"use strict\";\nexports.a = 1;\n//# sourceMappingURL=app.js.map";
        assert_eq!(strip_source_mapping_url(text), "\"use strict\";\nexports.a = 1;\n");
    }

    #[test]
    fn keeps_text_without_comment() {
        let text = "exports.a = 1;\n";
        assert_eq!(strip_source_mapping_url(text), text);
    }
}
