//! The incremental compilation engine.
//!
//! [`Engine`] is the object a host build integration holds for the lifetime
//! of the process. Each processed file goes through [`Engine::process`], which
//! finds or creates the [`CompilerInstance`] for the file's configuration,
//! updates its file table, and returns the emitted output. At the end of each
//! compilation pass the host calls [`Engine::after_compile`], which runs a
//! round per instance: the reverse dependency graph is rebuilt, the re-check
//! set is computed from the files modified since the previous round, and the
//! resulting diagnostics replace the previous round's errors. Between passes
//! [`Engine::watch_run`] feeds file-system changes into the instances.

#![warn(missing_docs)]

pub mod error;
pub mod graph;
pub mod host;
pub mod instance;
mod instance_host;
pub mod loader;
pub mod registry;
pub mod resolver;
pub mod round;
pub mod watch;

pub use error::EngineError;
pub use graph::{
    collect_all_dependants, DependencyGraph, ResolvedDependency, ReverseDependencyGraph,
};
pub use host::{
    BuildId, BuildIdentity, CustomTransformers, HostCompilation, HostResolver, LoaderHost,
};
pub use instance::{CompilerInstance, InstanceSetup};
pub use loader::LoaderOutput;
pub use registry::InstanceRegistry;
pub use resolver::ModuleResolver;
pub use round::RoundReport;
pub use watch::{ChangeTracker, RoundState};

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tsl_compiler::Compiler;
use tsl_config::{LoaderOptions, LoaderOptionsLayer};
use tsl_diagnostics::{DefaultFormatter, ErrorFormatter};
use tsl_source::{CaseSensitivity, FileSystem};

/// Process-wide engine state: registered compilers and the instance registry.
pub struct Engine {
    registry: InstanceRegistry<CompilerInstance>,
    compilers: RwLock<HashMap<String, Arc<dyn Compiler>>>,
    fs: Arc<dyn FileSystem>,
    layers: Vec<LoaderOptionsLayer>,
    case: CaseSensitivity,
}

impl Engine {
    /// Creates an engine reading files through `fs`.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            registry: InstanceRegistry::new(),
            compilers: RwLock::new(HashMap::new()),
            fs,
            layers: Vec::new(),
            case: CaseSensitivity::native(),
        }
    }

    /// Overrides the path case policy.
    pub fn with_case_sensitivity(mut self, case: CaseSensitivity) -> Self {
        self.case = case;
        self
    }

    /// Adds an option layer below the host-supplied options, such as the
    /// contents of a `tsl.toml` file.
    pub fn with_options_layer(mut self, layer: LoaderOptionsLayer) -> Self {
        self.layers.push(layer);
        self
    }

    /// Adds the layer of `<dir>/tsl.toml`, read through the engine's file
    /// system, when the file exists.
    pub fn with_options_file(self, dir: &Path) -> Result<Self, EngineError> {
        match LoaderOptionsLayer::load_from_dir(self.fs.as_ref(), dir)? {
            Some(layer) => Ok(self.with_options_layer(layer)),
            None => Ok(self),
        }
    }

    /// Makes a compiler selectable by its name.
    pub fn register_compiler(&self, compiler: Arc<dyn Compiler>) {
        let name = compiler.name().to_string();
        tracing::debug!(compiler = %name, version = compiler.version(), "compiler registered");
        self.compilers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, compiler);
    }

    fn compiler(&self, name: &str) -> Result<Arc<dyn Compiler>, EngineError> {
        self.compilers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::CompilerNotFound {
                name: name.to_string(),
            })
    }

    /// Starts tracking a host build.
    pub fn register_build(&self) -> BuildId {
        self.registry.register_build()
    }

    /// Drops every instance of a finished build.
    pub fn unregister_build(&self, id: BuildId) -> usize {
        self.registry.unregister_build(id)
    }

    /// Merges the engine's option layers with the host-supplied layer.
    pub fn loader_options(&self, host: &dyn LoaderHost) -> Result<LoaderOptions, EngineError> {
        let mut layers = self.layers.clone();
        layers.extend(host.loader_options());
        Ok(LoaderOptions::resolve(&layers)?)
    }

    /// Returns a cached instance.
    pub fn instance(
        &self,
        identity: BuildIdentity,
        name: &str,
    ) -> Option<Arc<Mutex<CompilerInstance>>> {
        self.registry.get(identity, name)
    }

    /// Processes one file: the integration entry point.
    ///
    /// Creates the instance on first use. Configuration and bootstrap
    /// failures are returned as errors and nothing is cached, so the next
    /// call retries.
    #[tracing::instrument(skip_all, fields(path = %path.display()))]
    pub fn process(
        &self,
        host: &mut dyn LoaderHost,
        path: &Path,
        text: &str,
    ) -> Result<LoaderOutput, EngineError> {
        let options = self.loader_options(&*host)?;
        let requesting_dir = path.parent().unwrap_or_else(|| Path::new("/"));
        let context = match &options.context {
            Some(dir) => host.root_context().join(dir),
            None => host.root_context().to_path_buf(),
        };

        let resolver = host.resolver();
        let formatter: Arc<dyn ErrorFormatter> = match host.error_formatter() {
            Some(formatter) => formatter,
            None => Arc::new(DefaultFormatter),
        };
        let transformers = host.custom_transformers();
        if transformers.is_none() {
            if let Some(module) = &options.get_custom_transformers {
                tracing::warn!(
                    %module,
                    "getCustomTransformers is set but the host supplied no transformers"
                );
            }
        }

        let identity = host.build_identity();
        let instance = self.registry.get_or_create(identity, &options.instance, |key| {
            CompilerInstance::create(InstanceSetup {
                key,
                compiler: self.compiler(&options.compiler)?,
                options: options.clone(),
                fs: Arc::clone(&self.fs),
                resolver,
                formatter,
                transformers,
                requesting_dir,
                context,
                case: self.case,
            })
        })?;

        let mut instance = instance.lock().unwrap_or_else(PoisonError::into_inner);
        let file = instance.file_key(path);
        instance.process_file(host, &file, text)
    }

    /// Runs a round for every instance of a build.
    pub fn after_compile(
        &self,
        identity: BuildIdentity,
        target: &mut dyn HostCompilation,
    ) -> Vec<RoundReport> {
        let mut reports = Vec::new();
        for instance in self.registry.instances_for(identity) {
            let mut instance = instance.lock().unwrap_or_else(PoisonError::into_inner);
            reports.push(instance.run_round(target));
        }
        reports
    }

    /// Feeds changed paths into every instance of a build.
    ///
    /// Returns the number of file records whose text changed.
    pub fn watch_run(&self, identity: BuildIdentity, changed: &[PathBuf]) -> usize {
        let count: usize = self
            .registry
            .instances_for(identity)
            .iter()
            .map(|instance| {
                instance
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .apply_file_changes(changed)
            })
            .sum();
        tracing::debug!(%identity, paths = changed.len(), changed = count, "watch run");
        count
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let compilers: Vec<String> = self
            .compilers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        f.debug_struct("Engine")
            .field("compilers", &compilers)
            .field("instances", &self.registry.len())
            .field("case", &self.case)
            .finish_non_exhaustive()
    }
}
