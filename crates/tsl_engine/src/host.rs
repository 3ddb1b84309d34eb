//! Interfaces the host build implements.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tsl_config::LoaderOptionsLayer;
use tsl_diagnostics::{ErrorFormatter, ErrorTarget, HostError};

/// An opaque handle for one running host build.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct BuildId(pub(crate) u64);

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "build#{}", self.0)
    }
}

/// The outer key of the instance registry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BuildIdentity {
    /// A build registered with [`Engine::register_build`](crate::Engine::register_build).
    Build(BuildId),
    /// Hosts without a stable build identity share this key.
    Shared,
}

impl fmt::Display for BuildIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildIdentity::Build(id) => id.fmt(f),
            BuildIdentity::Shared => f.write_str("shared"),
        }
    }
}

/// The host build's own module resolution.
pub trait HostResolver: Send + Sync {
    /// Resolves `request` as imported from a file in `from_dir`.
    ///
    /// Returns the absolute path of the file the host would bundle, or a
    /// description of why resolution failed.
    fn resolve_sync(&self, from_dir: &Path, request: &str) -> Result<PathBuf, String>;
}

/// Custom transformers supplied by the host through `getCustomTransformers`.
///
/// Runs on the JavaScript the compiler emitted for a file, before it is
/// returned to the host.
pub trait CustomTransformers: Send + Sync {
    /// Rewrites the emitted JavaScript of `file`.
    fn after_emit(&self, file: &Path, javascript: String) -> String;
}

/// The host context of one entry-point invocation.
pub trait LoaderHost {
    /// Identity of the build this invocation belongs to.
    fn build_identity(&self) -> BuildIdentity;

    /// Loader options supplied by the host, if any.
    fn loader_options(&self) -> Option<LoaderOptionsLayer>;

    /// Root directory of the build.
    fn root_context(&self) -> &Path;

    /// The host's resolver. Captured by an instance when it is created.
    fn resolver(&self) -> Arc<dyn HostResolver>;

    /// Registers a file the processed module depends on.
    fn add_dependency(&mut self, path: &Path);

    /// Error list of the module being processed.
    fn module_errors(&mut self) -> &mut Vec<HostError>;

    /// Custom message formatter, if configured.
    fn error_formatter(&self) -> Option<Arc<dyn ErrorFormatter>> {
        None
    }

    /// Function form of `getCustomTransformers`. Hosts that accept the path
    /// form load the module named by the option and return it here.
    fn custom_transformers(&self) -> Option<Arc<dyn CustomTransformers>> {
        None
    }
}

/// The host build at the end of a compilation pass.
pub trait HostCompilation: ErrorTarget {
    /// Adds an extra output file to the build.
    fn emit_asset(&mut self, name: PathBuf, text: String);
}
