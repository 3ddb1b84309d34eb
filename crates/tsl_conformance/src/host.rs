//! A recording host build: resolver, per-module error records, and assets.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tsl_config::LoaderOptionsLayer;
use tsl_diagnostics::{ErrorFormatter, ErrorTarget, HostError};
use tsl_engine::{BuildIdentity, CustomTransformers, HostCompilation, HostResolver, LoaderHost};
use tsl_source::path::normalize;
use tsl_source::FileSystem;

/// Extensions the host tries, in order, for extensionless requests.
const HOST_EXTENSIONS: [&str; 4] = [".ts", ".tsx", ".js", ".d.ts"];

/// Resolves requests against a file system, the way a bundler configured
/// with `resolve.extensions` and `resolve.alias` would.
pub struct FsResolver {
    fs: Arc<dyn FileSystem>,
    aliases: HashMap<String, PathBuf>,
}

impl FsResolver {
    /// A resolver over `fs` without aliases.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            aliases: HashMap::new(),
        }
    }

    /// Maps an exact request to a file.
    pub fn with_alias(mut self, request: impl Into<String>, target: impl Into<PathBuf>) -> Self {
        self.aliases.insert(request.into(), target.into());
        self
    }

    fn probe(&self, base: &Path) -> Option<PathBuf> {
        if self.fs.file_exists(base) {
            return Some(base.to_path_buf());
        }
        let with_ext = HOST_EXTENSIONS.iter().map(|ext| {
            let mut name = base.as_os_str().to_os_string();
            name.push(ext);
            PathBuf::from(name)
        });
        let index = HOST_EXTENSIONS
            .iter()
            .map(|ext| base.join(format!("index{ext}")));
        with_ext.chain(index).find(|c| self.fs.file_exists(c))
    }
}

impl HostResolver for FsResolver {
    fn resolve_sync(&self, from_dir: &Path, request: &str) -> Result<PathBuf, String> {
        if let Some(target) = self.aliases.get(request) {
            return Ok(target.clone());
        }
        let found = if request.starts_with('.') || request.starts_with('/') {
            self.probe(&normalize(&from_dir.join(request)))
        } else {
            from_dir
                .ancestors()
                .find_map(|dir| self.probe(&dir.join("node_modules").join(request)))
        };
        found.ok_or_else(|| {
            format!(
                "Module not found: Can't resolve '{request}' in '{}'",
                from_dir.display()
            )
        })
    }
}

/// A host build that records everything the engine does to it.
///
/// Module records exist for every file passed to
/// [`begin_module`](RecordingHost::begin_module); errors for other files land
/// in [`build_errors`](RecordingHost::build_errors).
pub struct RecordingHost {
    identity: BuildIdentity,
    root: PathBuf,
    resolver: Arc<dyn HostResolver>,
    options: Option<LoaderOptionsLayer>,
    formatter: Option<Arc<dyn ErrorFormatter>>,
    transformers: Option<Arc<dyn CustomTransformers>>,
    current: Option<PathBuf>,
    /// Error lists of processed modules.
    pub modules: BTreeMap<PathBuf, Vec<HostError>>,
    /// The build-wide error list.
    pub build_errors: Vec<HostError>,
    /// Dependencies registered per module.
    pub dependencies: BTreeMap<PathBuf, Vec<PathBuf>>,
    /// Extra output files.
    pub assets: BTreeMap<PathBuf, String>,
}

impl RecordingHost {
    /// A host for `identity` rooted at `root`.
    pub fn new(identity: BuildIdentity, root: impl Into<PathBuf>, resolver: Arc<dyn HostResolver>) -> Self {
        Self {
            identity,
            root: root.into(),
            resolver,
            options: None,
            formatter: None,
            transformers: None,
            current: None,
            modules: BTreeMap::new(),
            build_errors: Vec::new(),
            dependencies: BTreeMap::new(),
            assets: BTreeMap::new(),
        }
    }

    /// Sets the host-supplied loader options from their JSON form.
    ///
    /// # Panics
    ///
    /// Panics if the options do not deserialize.
    pub fn with_options(mut self, options: serde_json::Value) -> Self {
        self.options = Some(LoaderOptionsLayer::from_json(options).expect("valid loader options"));
        self
    }

    /// Sets a custom message formatter.
    pub fn with_formatter(mut self, formatter: Arc<dyn ErrorFormatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Supplies transformers, as a host that loaded `getCustomTransformers` would.
    pub fn set_transformers(&mut self, transformers: Arc<dyn CustomTransformers>) {
        self.transformers = Some(transformers);
    }

    /// Switches the identity, as a host restarting under a new build would.
    pub fn set_identity(&mut self, identity: BuildIdentity) {
        self.identity = identity;
    }

    /// Starts processing `path`: creates its module record and clears the
    /// dependencies registered by its previous processing.
    pub fn begin_module(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.modules.entry(path.clone()).or_default();
        self.dependencies.insert(path.clone(), Vec::new());
        self.current = Some(path);
    }

    /// Errors recorded on a module.
    pub fn errors_for(&self, path: impl AsRef<Path>) -> &[HostError] {
        self.modules
            .get(path.as_ref())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Codes of the errors on a module, in record order.
    pub fn codes_for(&self, path: impl AsRef<Path>) -> Vec<u32> {
        self.errors_for(path)
            .iter()
            .filter_map(|e| e.code.map(|c| c.number()))
            .collect()
    }

    /// Every recorded error, module records first.
    pub fn all_errors(&self) -> impl Iterator<Item = &HostError> {
        self.modules.values().flatten().chain(&self.build_errors)
    }

    /// Dependencies registered while processing `path`.
    pub fn dependencies_of(&self, path: impl AsRef<Path>) -> &[PathBuf] {
        self.dependencies
            .get(path.as_ref())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl LoaderHost for RecordingHost {
    fn build_identity(&self) -> BuildIdentity {
        self.identity
    }

    fn loader_options(&self) -> Option<LoaderOptionsLayer> {
        self.options.clone()
    }

    fn root_context(&self) -> &Path {
        &self.root
    }

    fn resolver(&self) -> Arc<dyn HostResolver> {
        Arc::clone(&self.resolver)
    }

    fn add_dependency(&mut self, path: &Path) {
        if let Some(current) = &self.current {
            self.dependencies
                .entry(current.clone())
                .or_default()
                .push(path.to_path_buf());
        }
    }

    fn module_errors(&mut self) -> &mut Vec<HostError> {
        match &self.current {
            Some(current) => self.modules.entry(current.clone()).or_default(),
            None => &mut self.build_errors,
        }
    }

    fn error_formatter(&self) -> Option<Arc<dyn ErrorFormatter>> {
        self.formatter.clone()
    }

    fn custom_transformers(&self) -> Option<Arc<dyn CustomTransformers>> {
        self.transformers.clone()
    }
}

impl ErrorTarget for RecordingHost {
    fn module_errors(&mut self, file: &Path) -> Option<&mut Vec<HostError>> {
        self.modules.get_mut(file)
    }

    fn build_errors(&mut self) -> &mut Vec<HostError> {
        &mut self.build_errors
    }
}

impl HostCompilation for RecordingHost {
    fn emit_asset(&mut self, name: PathBuf, text: String) {
        self.assets.insert(name, text);
    }
}
