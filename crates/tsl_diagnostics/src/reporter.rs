//! Filtering, formatting, tagging, and routing of compiler diagnostics.

use crate::diagnostic::Diagnostic;
use crate::formatter::{ErrorFormatter, ErrorInfo};
use crate::host_error::{ErrorLocation, HostError};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tsl_source::{FilePath, FileTable};

/// Errors raised while building a reporter from configuration.
#[derive(Debug, thiserror::Error)]
pub enum ReporterError {
    /// A `reportFiles` entry is not a valid glob.
    #[error("invalid reportFiles pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The offending pattern as configured.
        pattern: String,
        /// Why the glob compiler rejected it.
        reason: String,
    },
}

/// Where reported errors end up in the host build.
pub trait ErrorTarget {
    /// The mutable error list of the host module built from `file`, if the
    /// host has such a module.
    fn module_errors(&mut self, file: &Path) -> Option<&mut Vec<HostError>>;

    /// The build-wide error list.
    fn build_errors(&mut self) -> &mut Vec<HostError>;
}

/// Settings a reporter is built from.
#[derive(Debug, Clone)]
pub struct ReporterConfig {
    /// Tag attached to every error this reporter produces.
    pub origin: String,
    /// Directory that file names in messages are made relative to.
    pub context: PathBuf,
    /// Diagnostic codes that are never reported.
    pub ignore_diagnostics: Vec<u32>,
    /// Glob allow list; entries starting with `!` exclude. Empty reports everything.
    pub report_files: Vec<String>,
}

/// Compiled `reportFiles` globs.
#[derive(Debug)]
struct ReportFilter {
    include: Option<GlobSet>,
    exclude: GlobSet,
}

impl ReportFilter {
    fn new(patterns: &[String]) -> Result<Option<Self>, ReporterError> {
        if patterns.is_empty() {
            return Ok(None);
        }
        let mut include = GlobSetBuilder::new();
        let mut exclude = GlobSetBuilder::new();
        let mut has_include = false;
        for pattern in patterns {
            let (negated, raw) = match pattern.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, pattern.as_str()),
            };
            let glob = Glob::new(raw).map_err(|e| ReporterError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
            if negated {
                exclude.add(glob);
            } else {
                has_include = true;
                include.add(glob);
            }
        }
        let build = |builder: GlobSetBuilder| {
            builder.build().map_err(|e| ReporterError::InvalidPattern {
                pattern: patterns.join(", "),
                reason: e.to_string(),
            })
        };
        Ok(Some(Self {
            include: if has_include { Some(build(include)?) } else { None },
            exclude: build(exclude)?,
        }))
    }

    fn matches(&self, relative: &Path) -> bool {
        let included = self.include.as_ref().map_or(true, |set| set.is_match(relative));
        included && !self.exclude.is_match(relative)
    }
}

/// Turns compiler diagnostics into tagged host errors and routes them.
///
/// The reporting model is "declare this round's complete error set for the
/// files that were checked": before new errors for a file are added, every
/// error this reporter's origin previously attached for that file is removed.
pub struct DiagnosticReporter {
    origin: String,
    context: PathBuf,
    ignore: HashSet<u32>,
    filter: Option<ReportFilter>,
    formatter: Arc<dyn ErrorFormatter>,
}

impl DiagnosticReporter {
    /// Builds a reporter, compiling the `reportFiles` globs.
    pub fn new(
        config: ReporterConfig,
        formatter: Arc<dyn ErrorFormatter>,
    ) -> Result<Self, ReporterError> {
        Ok(Self {
            filter: ReportFilter::new(&config.report_files)?,
            origin: config.origin,
            context: config.context,
            ignore: config.ignore_diagnostics.into_iter().collect(),
            formatter,
        })
    }

    /// The tag attached to this reporter's errors.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Returns `true` unless the diagnostic's code is ignored or its file is
    /// filtered out by `reportFiles`.
    pub fn should_report(&self, diag: &Diagnostic) -> bool {
        if self.ignore.contains(&diag.code.number()) {
            return false;
        }
        match (&self.filter, &diag.file) {
            (Some(filter), Some(file)) => filter.matches(&self.relative(file.as_path())),
            _ => true,
        }
    }

    /// Converts one diagnostic, resolving its span against the file table.
    pub fn to_host_error(&self, diag: &Diagnostic, files: &FileTable) -> HostError {
        let resolved = match (&diag.file, diag.span) {
            (Some(file), Some(span)) => files.resolve_span(file, span),
            _ => None,
        };
        let relative = diag.file.as_ref().map(|f| self.relative(f.as_path()));
        let info = ErrorInfo {
            severity: diag.severity,
            code: diag.code,
            message: &diag.message,
            file: relative.as_deref(),
            line: resolved.as_ref().map(|r| r.start_line),
            character: resolved.as_ref().map(|r| r.start_col),
        };
        HostError {
            severity: diag.severity,
            code: Some(diag.code),
            message: self.formatter.format(&info),
            file: diag.file.as_ref().map(|f| f.as_path().to_path_buf()),
            location: resolved.map(|r| ErrorLocation {
                line: r.start_line,
                character: r.start_col,
                end_line: r.end_line,
                end_character: r.end_col,
            }),
            origin: Some(self.origin.clone()),
        }
    }

    /// Filters and converts a batch of diagnostics, dropping exact duplicates.
    pub fn format(&self, diagnostics: &[Diagnostic], files: &FileTable) -> Vec<HostError> {
        let mut errors: Vec<HostError> = Vec::new();
        for diag in diagnostics.iter().filter(|d| self.should_report(d)) {
            let error = self.to_host_error(diag, files);
            if !errors.contains(&error) {
                errors.push(error);
            }
        }
        errors
    }

    /// Replaces this origin's errors for every file in `checked` with `errors`.
    ///
    /// Errors go to the module record of their file when the host has one,
    /// otherwise to the build-wide list.
    pub fn report_files<T: ErrorTarget + ?Sized>(
        &self,
        target: &mut T,
        checked: &[FilePath],
        errors: Vec<HostError>,
    ) {
        tracing::trace!(
            origin = %self.origin,
            checked = checked.len(),
            reported = errors.len(),
            "replacing round errors"
        );
        for file in checked {
            self.clear_file(target, file.as_path());
        }
        for error in errors {
            let module = match error.file.as_deref() {
                Some(file) => target.module_errors(file),
                None => None,
            };
            match module {
                Some(list) => list.push(error),
                None => target.build_errors().push(error),
            }
        }
    }

    /// Replaces this origin's file-less errors in the build-wide list.
    pub fn report_global<T: ErrorTarget + ?Sized>(
        &self,
        target: &mut T,
        errors: Vec<HostError>,
    ) {
        let list = target.build_errors();
        list.retain(|e| !(e.is_from(&self.origin) && e.file.is_none()));
        list.extend(errors);
    }

    /// Replaces this origin's errors in a single module's error list.
    pub fn replace_module_errors(&self, list: &mut Vec<HostError>, errors: Vec<HostError>) {
        list.retain(|e| !e.is_from(&self.origin));
        list.extend(errors);
    }

    fn clear_file<T: ErrorTarget + ?Sized>(&self, target: &mut T, file: &Path) {
        if let Some(list) = target.module_errors(file) {
            list.retain(|e| !e.is_from(&self.origin));
            return;
        }
        target
            .build_errors()
            .retain(|e| !(e.is_from(&self.origin) && e.file.as_deref() == Some(file)));
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.context)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

impl std::fmt::Debug for DiagnosticReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosticReporter")
            .field("origin", &self.origin)
            .field("context", &self.context)
            .field("ignore", &self.ignore)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::DefaultFormatter;
    use crate::severity::Severity;
    use std::collections::HashMap;
    use tsl_source::{CaseSensitivity, Provenance, TextSpan};

    #[derive(Default)]
    struct Target {
        modules: HashMap<PathBuf, Vec<HostError>>,
        build: Vec<HostError>,
    }

    impl ErrorTarget for Target {
        fn module_errors(&mut self, file: &Path) -> Option<&mut Vec<HostError>> {
            self.modules.get_mut(file)
        }

        fn build_errors(&mut self) -> &mut Vec<HostError> {
            &mut self.build
        }
    }

    fn reporter(ignore: Vec<u32>, report_files: Vec<&str>) -> DiagnosticReporter {
        DiagnosticReporter::new(
            ReporterConfig {
                origin: "tsl-default_0".to_string(),
                context: PathBuf::from("/p"),
                ignore_diagnostics: ignore,
                report_files: report_files.into_iter().map(String::from).collect(),
            },
            Arc::new(DefaultFormatter),
        )
        .unwrap()
    }

    fn files() -> (FileTable, FilePath) {
        let mut t = FileTable::new(CaseSensitivity::Sensitive);
        let app = t.key("/p/src/app.ts");
        t.update_text(&app, "let a = 1;\nlet b: number = 'x';\n", Provenance::Memory);
        (t, app)
    }

    fn type_error(file: &FilePath) -> Diagnostic {
        Diagnostic::error(2322, "Type 'string' is not assignable to type 'number'.")
            .at(file.clone(), TextSpan::new(15, 1))
    }

    #[test]
    fn converts_to_one_based_position() {
        let (t, app) = files();
        let r = reporter(vec![], vec![]);
        let e = r.to_host_error(&type_error(&app), &t);
        let loc = e.location.unwrap();
        assert_eq!((loc.line, loc.character), (2, 5));
        assert_eq!(
            e.message,
            "ERROR in src/app.ts(2,5): TS2322: Type 'string' is not assignable to type 'number'."
        );
        assert!(e.is_from("tsl-default_0"));
        assert_eq!(e.file.as_deref(), Some(Path::new("/p/src/app.ts")));
    }

    #[test]
    fn ignored_codes_are_dropped() {
        let (t, app) = files();
        let r = reporter(vec![2322], vec![]);
        assert!(r.format(&[type_error(&app)], &t).is_empty());
    }

    #[test]
    fn duplicate_diagnostics_are_reported_once() {
        let (t, app) = files();
        let r = reporter(vec![], vec![]);
        assert_eq!(r.format(&[type_error(&app), type_error(&app)], &t).len(), 1);
    }

    #[test]
    fn report_files_allow_and_deny() {
        let (mut t, app) = files();
        let gen = t.key("/p/src/generated/api.ts");
        t.update_text(&gen, "x", Provenance::Memory);
        let r = reporter(vec![], vec!["src/**/*.ts", "!src/generated/**"]);
        assert!(r.should_report(&type_error(&app)));
        assert!(!r.should_report(&type_error(&gen)));
        // global diagnostics bypass the file filter
        assert!(r.should_report(&Diagnostic::error(5023, "Unknown compiler option.")));
    }

    #[test]
    fn only_negated_patterns_include_everything_else() {
        let (t, app) = files();
        let r = reporter(vec![], vec!["!**/*.spec.ts"]);
        assert_eq!(r.format(&[type_error(&app)], &t).len(), 1);
    }

    #[test]
    fn invalid_glob_is_rejected() {
        let err = DiagnosticReporter::new(
            ReporterConfig {
                origin: "tsl".to_string(),
                context: PathBuf::from("/p"),
                ignore_diagnostics: vec![],
                report_files: vec!["src/[".to_string()],
            },
            Arc::new(DefaultFormatter),
        )
        .unwrap_err();
        assert!(err.to_string().contains("src/["));
    }

    #[test]
    fn routes_to_module_record_when_present() {
        let (t, app) = files();
        let r = reporter(vec![], vec![]);
        let mut target = Target::default();
        target.modules.insert(PathBuf::from("/p/src/app.ts"), vec![]);
        let errors = r.format(&[type_error(&app)], &t);
        r.report_files(&mut target, &[app], errors);
        assert_eq!(target.modules[Path::new("/p/src/app.ts")].len(), 1);
        assert!(target.build.is_empty());
    }

    #[test]
    fn routes_to_build_list_without_module_record() {
        let (t, app) = files();
        let r = reporter(vec![], vec![]);
        let mut target = Target::default();
        let errors = r.format(&[type_error(&app)], &t);
        r.report_files(&mut target, &[app], errors);
        assert_eq!(target.build.len(), 1);
    }

    #[test]
    fn previous_round_errors_are_replaced_not_appended() {
        let (t, app) = files();
        let r = reporter(vec![], vec![]);
        let mut target = Target::default();
        let foreign = HostError::message(Severity::Warning, "lint: prefer-const").with_origin("eslint");
        target
            .modules
            .insert(PathBuf::from("/p/src/app.ts"), vec![foreign.clone()]);

        for _ in 0..3 {
            let errors = r.format(&[type_error(&app)], &t);
            r.report_files(&mut target, &[app.clone()], errors);
        }
        let list = &target.modules[Path::new("/p/src/app.ts")];
        assert_eq!(list.len(), 2);
        assert!(list.contains(&foreign));

        // a clean round retracts the error but keeps foreign ones
        r.report_files(&mut target, &[app], vec![]);
        assert_eq!(target.modules[Path::new("/p/src/app.ts")], vec![foreign]);
    }

    #[test]
    fn build_list_retraction_is_per_file() {
        let (mut t, app) = files();
        let lib = t.key("/p/src/lib.ts");
        t.update_text(&lib, "x", Provenance::Memory);
        let r = reporter(vec![], vec![]);
        let mut target = Target::default();
        let errors = r.format(&[type_error(&app), type_error(&lib)], &t);
        r.report_files(&mut target, &[app.clone(), lib], errors);
        assert_eq!(target.build.len(), 2);

        r.report_files(&mut target, &[app], vec![]);
        assert_eq!(target.build.len(), 1);
        assert_eq!(target.build[0].file.as_deref(), Some(Path::new("/p/src/lib.ts")));
    }

    #[test]
    fn global_errors_replace_previous_globals() {
        let (t, _) = files();
        let r = reporter(vec![], vec![]);
        let mut target = Target::default();
        let diags = [Diagnostic::error(5023, "Unknown compiler option 'strictest'.")];
        r.report_global(&mut target, r.format(&diags, &t));
        r.report_global(&mut target, r.format(&diags, &t));
        assert_eq!(target.build.len(), 1);
        assert_eq!(
            target.build[0].message,
            "ERROR: TS5023: Unknown compiler option 'strictest'."
        );
    }

    #[test]
    fn replace_module_errors_keeps_foreign() {
        let r = reporter(vec![], vec![]);
        let mut list = vec![
            HostError::message(Severity::Error, "old").with_origin("tsl-default_0"),
            HostError::message(Severity::Error, "other tool"),
        ];
        r.replace_module_errors(
            &mut list,
            vec![HostError::message(Severity::Error, "new").with_origin("tsl-default_0")],
        );
        let messages: Vec<_> = list.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["other tool", "new"]);
    }
}
