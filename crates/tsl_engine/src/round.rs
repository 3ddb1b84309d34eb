//! One compilation round: re-check, report, and emit declarations.

use crate::graph::ReverseDependencyGraph;
use crate::host::HostCompilation;
use crate::instance::CompilerInstance;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tsl_diagnostics::Severity;
use tsl_source::FilePath;

/// What one round did for one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundReport {
    /// Instance key.
    pub instance: String,
    /// Rounds completed by the instance, including this one.
    pub generation: u64,
    /// Files whose diagnostics were recomputed.
    pub rechecked: Vec<PathBuf>,
    /// Reported errors.
    pub errors: usize,
    /// Reported warnings and infos.
    pub warnings: usize,
    /// Declaration assets emitted.
    pub declarations: Vec<PathBuf>,
    /// `true` when the instance does not type-check (transpile-only).
    pub skipped: bool,
}

impl CompilerInstance {
    /// Runs a round: re-checks the affected files and replaces their errors.
    ///
    /// The reverse graph is rebuilt from the forward graph first. On the
    /// first round the options diagnostics are reported to the build-wide
    /// list. Every file in the re-check set has its errors from the previous
    /// round replaced, so files that became clean lose their errors.
    #[tracing::instrument(skip_all, fields(instance = %self.key))]
    pub fn run_round(&mut self, target: &mut dyn HostCompilation) -> RoundReport {
        if self.loader_options.transpile_only {
            return RoundReport {
                instance: self.key.clone(),
                generation: self.tracker.generation(),
                rechecked: Vec::new(),
                errors: 0,
                warnings: 0,
                declarations: Vec::new(),
                skipped: true,
            };
        }

        self.reverse = ReverseDependencyGraph::rebuild(&self.graph);
        let first_round = self.tracker.is_first_round();
        let recheck = self.tracker.recheck_set(&self.files, &self.reverse);

        if first_round {
            let diagnostics = self.options_diagnostics();
            let errors = self.reporter.format(&diagnostics, &self.files);
            self.reporter.report_global(target, errors);
        }

        let extensions = self.compiler_options.script_extensions();
        let mut diagnostics = Vec::new();
        let mut errored = BTreeSet::new();
        for file in &recheck {
            if !file.is_script(&extensions) {
                continue;
            }
            let found = self.diagnostics_for(file);
            if found.iter().any(|d| self.reporter.should_report(d)) {
                errored.insert(file.clone());
            }
            diagnostics.extend(found);
        }

        let errors = self.reporter.format(&diagnostics, &self.files);
        let error_count = errors.iter().filter(|e| e.severity == Severity::Error).count();
        let warning_count = errors.len() - error_count;
        let checked: Vec<FilePath> = recheck.iter().cloned().collect();
        self.reporter.report_files(target, &checked, errors);

        let wants_declarations =
            self.compiler_options.declaration() && !self.compiler_options.no_emit();
        let declarations = if wants_declarations {
            self.emit_declarations(&recheck, target)
        } else {
            Vec::new()
        };

        self.tracker.finish_round(errored);
        tracing::debug!(
            generation = self.tracker.generation(),
            rechecked = checked.len(),
            errors = error_count,
            warnings = warning_count,
            "round finished"
        );

        RoundReport {
            instance: self.key.clone(),
            generation: self.tracker.generation(),
            rechecked: checked.iter().map(|f| f.as_path().to_path_buf()).collect(),
            errors: error_count,
            warnings: warning_count,
            declarations,
            skipped: false,
        }
    }

    fn emit_declarations(
        &mut self,
        recheck: &BTreeSet<FilePath>,
        target: &mut dyn HostCompilation,
    ) -> Vec<PathBuf> {
        let mut emitted = Vec::new();
        for file in recheck {
            let is_root = self.files.get(file).is_some_and(|r| r.is_root());
            if !is_root || file.is_declaration() {
                continue;
            }
            let output = self.emit_file(file);
            for declaration in output.declarations() {
                let name = relative_to(&declaration.name, &self.context);
                target.emit_asset(name.clone(), declaration.text.clone());
                emitted.push(name);
            }
        }
        emitted
    }
}

fn relative_to(path: &Path, base: &Path) -> PathBuf {
    path.strip_prefix(base)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}
