//! A compiler instance: one persistent incremental compilation.

use crate::error::EngineError;
use crate::graph::{DependencyGraph, ReverseDependencyGraph};
use crate::host::{CustomTransformers, HostResolver};
use crate::instance_host::InstanceHost;
use crate::resolver::ModuleResolver;
use crate::watch::ChangeTracker;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tsl_compiler::{Compiler, CompilerHost, CompilerOptions, CompilerSession, EmitOutput};
use tsl_config::{resolve_config, LoaderOptions, SuffixRules};
use tsl_diagnostics::{Diagnostic, DiagnosticReporter, ErrorFormatter, ReporterConfig};
use tsl_source::{CaseSensitivity, FilePath, FileSystem, FileTable, Provenance, TextUpdate};

/// Everything needed to bootstrap an instance.
pub struct InstanceSetup<'a> {
    /// Registry key, such as `default_0`.
    pub key: &'a str,
    /// The compiler selected by the `compiler` option.
    pub compiler: Arc<dyn Compiler>,
    /// Merged loader options.
    pub options: LoaderOptions,
    /// File system used for configuration and source files.
    pub fs: Arc<dyn FileSystem>,
    /// The host build's resolver.
    pub resolver: Arc<dyn HostResolver>,
    /// Formatter for reported messages.
    pub formatter: Arc<dyn ErrorFormatter>,
    /// Host transformers applied to emitted JavaScript.
    pub transformers: Option<Arc<dyn CustomTransformers>>,
    /// Directory of the file that triggered creation.
    pub requesting_dir: &'a Path,
    /// Directory reported file names are relative to.
    pub context: PathBuf,
    /// Path comparison policy.
    pub case: CaseSensitivity,
}

/// One compilation unit: configuration, files, graphs, and compiler session.
///
/// Created lazily on the first file processed under a configuration and kept
/// for the rest of the build. Access must be serialized; the registry hands
/// instances out behind a mutex.
pub struct CompilerInstance {
    pub(crate) key: String,
    pub(crate) compiler: Arc<dyn Compiler>,
    pub(crate) loader_options: LoaderOptions,
    pub(crate) compiler_options: CompilerOptions,
    pub(crate) config_file_path: Option<PathBuf>,
    pub(crate) project_references: Vec<PathBuf>,
    pub(crate) context: PathBuf,
    pub(crate) files: FileTable,
    pub(crate) graph: DependencyGraph,
    pub(crate) reverse: ReverseDependencyGraph,
    pub(crate) session: Box<dyn CompilerSession>,
    pub(crate) resolver: ModuleResolver,
    pub(crate) tracker: ChangeTracker,
    pub(crate) reporter: DiagnosticReporter,
    pub(crate) fs: Arc<dyn FileSystem>,
    pub(crate) transformers: Option<Arc<dyn CustomTransformers>>,
}

impl CompilerInstance {
    /// Resolves the configuration and starts a compiler session.
    ///
    /// Fails when the configuration cannot be found, read, or parsed, when
    /// the compiler reports errors in it, or when a file it lists is missing.
    #[tracing::instrument(skip_all, fields(key = setup.key))]
    pub fn create(setup: InstanceSetup<'_>) -> Result<Self, EngineError> {
        let InstanceSetup {
            key,
            compiler,
            options,
            fs,
            resolver,
            formatter,
            transformers,
            requesting_dir,
            context,
            case,
        } = setup;

        let resolved = resolve_config(fs.as_ref(), &options, requesting_dir)?;
        let base_dir = resolved.base_dir(requesting_dir);
        let parsed = compiler.parse_config(&resolved.config, &base_dir, fs.as_ref())?;

        let config_errors: Vec<String> = parsed
            .errors
            .iter()
            .filter(|d| d.severity.is_error())
            .map(|d| format!("{}: {}", d.code, d.message))
            .collect();
        if !config_errors.is_empty() {
            return Err(EngineError::InvalidConfig {
                path: resolved.config_file_path,
                message: config_errors.join("\n"),
            });
        }

        let suffix_rules = SuffixRules::compile(&options)?;
        let reporter = DiagnosticReporter::new(
            ReporterConfig {
                origin: format!("tsl-{key}"),
                context: context.clone(),
                ignore_diagnostics: options.ignore_diagnostics.clone(),
                report_files: options.report_files.clone(),
            },
            formatter,
        )?;

        let mut files = FileTable::new(case);
        if !options.only_compile_bundled_files && !options.transpile_only {
            for name in &parsed.file_names {
                let file = files.key(name);
                if files.load(fs.as_ref(), &file).is_none() {
                    return Err(EngineError::MissingFile { path: name.clone() });
                }
                files.mark_root(&file);
            }
        }

        if !options.silent {
            tracing::info!(
                compiler = compiler.name(),
                version = compiler.version(),
                config = ?resolved.config_file_path,
                "using {} {}",
                compiler.name(),
                compiler.version()
            );
        }

        let session = compiler.create_session(&parsed.options);
        let resolver = ModuleResolver::new(Arc::clone(&compiler), resolver, suffix_rules);

        Ok(Self {
            key: key.to_string(),
            compiler,
            loader_options: options,
            compiler_options: parsed.options,
            config_file_path: resolved.config_file_path,
            project_references: parsed.project_references,
            context,
            files,
            graph: DependencyGraph::new(),
            reverse: ReverseDependencyGraph::default(),
            session,
            resolver,
            tracker: ChangeTracker::new(),
            reporter,
            fs,
            transformers,
        })
    }

    /// Splits the instance into its session and the host view the session needs.
    fn session_and_host(&mut self) -> (&mut dyn CompilerSession, InstanceHost<'_>) {
        let Self {
            session,
            files,
            graph,
            resolver,
            compiler_options,
            fs,
            ..
        } = self;
        let host = InstanceHost {
            files,
            graph,
            resolver,
            options: compiler_options,
            fs: &**fs,
        };
        (session.as_mut(), host)
    }

    /// Table key of a processed file, with suffix rules applied.
    pub fn file_key(&self, path: &Path) -> FilePath {
        self.files.key(self.resolver.analyzed_path(path))
    }

    /// Writes in-memory text for a file, recording it as modified on change.
    pub fn update_file(&mut self, file: &FilePath, text: &str) -> TextUpdate {
        let update = self.files.update_text(file, text, Provenance::Memory);
        if update.is_change() {
            self.tracker.record_change(file.clone());
        }
        update
    }

    /// Re-reads changed files from disk.
    ///
    /// Paths that are not scripts or not yet in the file table are ignored.
    /// Returns the number of files whose text actually changed.
    pub fn apply_file_changes(&mut self, changed: &[PathBuf]) -> usize {
        let extensions = self.compiler_options.script_extensions();
        let mut count = 0;
        for path in changed {
            let file = self.files.key(path);
            if !file.is_script(&extensions) {
                continue;
            }
            let update = self.files.reload(self.fs.as_ref(), &file);
            if let Some(TextUpdate::Changed(version)) = update {
                tracing::trace!(file = %file, version, "file changed on disk");
                self.tracker.record_change(file);
                count += 1;
            }
        }
        count
    }

    /// Syntactic then semantic diagnostics of one file.
    pub fn diagnostics_for(&mut self, file: &FilePath) -> Vec<Diagnostic> {
        let (session, mut host) = self.session_and_host();
        let mut diagnostics = session.syntactic_diagnostics(&mut host, file.as_path());
        diagnostics.extend(session.semantic_diagnostics(&mut host, file.as_path()));
        diagnostics
    }

    /// Diagnostics about the compiler options.
    pub fn options_diagnostics(&mut self) -> Vec<Diagnostic> {
        let (session, mut host) = self.session_and_host();
        session.options_diagnostics(&mut host)
    }

    /// Emits one file.
    pub fn emit_file(&mut self, file: &FilePath) -> EmitOutput {
        let (session, mut host) = self.session_and_host();
        session.emit(&mut host, file.as_path())
    }

    /// Root file names as the session sees them.
    pub fn root_file_names(&mut self) -> Vec<PathBuf> {
        let (_, host) = self.session_and_host();
        host.root_file_names()
    }

    /// Registry key, such as `default_0`.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Tag carried by this instance's reported errors.
    pub fn origin(&self) -> &str {
        self.reporter.origin()
    }

    /// Name of the compiler in use.
    pub fn compiler_name(&self) -> &str {
        self.compiler.name()
    }

    /// Merged loader options.
    pub fn loader_options(&self) -> &LoaderOptions {
        &self.loader_options
    }

    /// Parsed compiler options.
    pub fn compiler_options(&self) -> &CompilerOptions {
        &self.compiler_options
    }

    /// The configuration file in use, if one was found.
    pub fn config_file_path(&self) -> Option<&Path> {
        self.config_file_path.as_deref()
    }

    /// Referenced project configurations, empty unless `projectReferences` is on.
    pub fn project_references(&self) -> &[PathBuf] {
        &self.project_references
    }

    /// Directory reported file names are relative to.
    pub fn context(&self) -> &Path {
        &self.context
    }

    /// The file table.
    pub fn files(&self) -> &FileTable {
        &self.files
    }

    /// The forward dependency graph.
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// The reverse dependency graph as of the last round.
    pub fn reverse_graph(&self) -> &ReverseDependencyGraph {
        &self.reverse
    }

    /// The change tracker.
    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }
}

impl std::fmt::Debug for CompilerInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompilerInstance")
            .field("key", &self.key)
            .field("compiler", &self.compiler.name())
            .field("config_file_path", &self.config_file_path)
            .field("files", &self.files.len())
            .field("generation", &self.tracker.generation())
            .finish_non_exhaustive()
    }
}
