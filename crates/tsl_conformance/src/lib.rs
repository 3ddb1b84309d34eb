//! Conformance support for the tsl engine.
//!
//! The engine is compiler-agnostic, so its behavior is exercised against
//! [`ScriptCompiler`], a small deterministic compiler for a line-oriented
//! TypeScript subset, and [`RecordingHost`], a host build that records every
//! error, dependency, and asset the engine hands it. [`Harness`] wires both to
//! an in-memory project for the scenario tests under `tests/`.

#![warn(missing_docs)]

pub mod compiler;
pub mod host;
pub mod script;

pub use compiler::{CheckLog, ScriptCompiler};
pub use host::{FsResolver, RecordingHost};

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tsl_engine::{
    BuildId, BuildIdentity, CompilerInstance, Engine, EngineError, LoaderOutput, RoundReport,
};
use tsl_source::{CaseSensitivity, FileSystem, MemoryFileSystem};

/// Root directory of harness projects.
pub const ROOT: &str = "/project";

/// One build of an in-memory project.
pub struct Harness {
    /// The project's files.
    pub fs: Arc<MemoryFileSystem>,
    /// The engine under test.
    pub engine: Engine,
    /// The registered build.
    pub build: BuildId,
    /// The host build.
    pub host: RecordingHost,
    checks: CheckLog,
}

impl Harness {
    /// A project with `files` and no loader options.
    pub fn new(files: &[(&str, &str)]) -> Self {
        Self::with_options(files, serde_json::json!({}))
    }

    /// A project with `files` and host-supplied loader options.
    pub fn with_options(files: &[(&str, &str)], options: serde_json::Value) -> Self {
        let fs = Arc::new(MemoryFileSystem::with_files(files.iter().copied()));
        let engine = Engine::new(fs.clone()).with_case_sensitivity(CaseSensitivity::Sensitive);
        let compiler = ScriptCompiler::new();
        let checks = compiler.check_log();
        engine.register_compiler(Arc::new(compiler));
        let build = engine.register_build();
        let resolver = Arc::new(FsResolver::new(fs.clone()));
        let host = RecordingHost::new(BuildIdentity::Build(build), ROOT, resolver)
            .with_options(options);
        Self {
            fs,
            engine,
            build,
            host,
            checks,
        }
    }

    /// The registry identity of this build.
    pub fn identity(&self) -> BuildIdentity {
        BuildIdentity::Build(self.build)
    }

    /// Runs the engine on a file, reading its text from the project.
    pub fn process(&mut self, path: &str) -> Result<LoaderOutput, EngineError> {
        let text = self.fs.read_file(Path::new(path)).unwrap_or_default();
        self.host.begin_module(path);
        self.engine.process(&mut self.host, Path::new(path), &text)
    }

    /// Processes every path.
    ///
    /// # Panics
    ///
    /// Panics if any file fails to process.
    pub fn process_all(&mut self, paths: &[&str]) -> Vec<LoaderOutput> {
        paths
            .iter()
            .map(|path| {
                self.process(path)
                    .unwrap_or_else(|e| panic!("processing {path} failed: {e}"))
            })
            .collect()
    }

    /// Ends the compilation pass and returns the single instance's report.
    ///
    /// # Panics
    ///
    /// Panics unless the build has exactly one instance.
    pub fn round(&mut self) -> RoundReport {
        let mut reports = self.engine.after_compile(self.identity(), &mut self.host);
        assert_eq!(reports.len(), 1, "expected a single instance");
        reports.remove(0)
    }

    /// Writes a file and tells the engine it changed.
    pub fn edit(&mut self, path: &str, text: &str) -> usize {
        self.fs.write(path, text);
        self.engine.watch_run(self.identity(), &[PathBuf::from(path)])
    }

    /// A watch rebuild: applies the changes, re-runs the loader on the
    /// changed files the host bundles, and ends the pass.
    ///
    /// # Panics
    ///
    /// Panics if a bundled file fails to process.
    pub fn rebuild(&mut self, changed: &[(&str, &str)]) -> RoundReport {
        for (path, text) in changed {
            self.edit(path, text);
        }
        for (path, _) in changed {
            if self.host.modules.contains_key(Path::new(path)) {
                if let Err(e) = self.process(path) {
                    panic!("reprocessing {path} failed: {e}");
                }
            }
        }
        self.round()
    }

    /// The instance named `default`.
    ///
    /// # Panics
    ///
    /// Panics if no file has been processed yet.
    pub fn instance(&self) -> Arc<Mutex<CompilerInstance>> {
        self.engine
            .instance(self.identity(), "default")
            .expect("instance should exist")
    }

    /// Files type-checked since the last call, sorted.
    pub fn checked(&self) -> Vec<PathBuf> {
        self.checks.take()
    }
}

/// Joins a project-relative path onto [`ROOT`].
pub fn project_path(relative: &str) -> PathBuf {
    Path::new(ROOT).join(relative)
}
