//! Forward and reverse dependency graphs between program files.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use tsl_source::FilePath;

/// One resolved import of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependency {
    /// The file the compiler analyzes.
    pub resolved: FilePath,
    /// The file the host bundles.
    pub original: PathBuf,
    /// Whether the import comes from an external package.
    pub is_external_library_import: bool,
}

/// Containing file to its resolved imports, in import order.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    edges: HashMap<FilePath, Vec<ResolvedDependency>>,
}

impl DependencyGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the imports recorded for `containing`.
    ///
    /// Failed resolutions (`None`) are dropped. Edges from an earlier
    /// resolution of the same file never survive.
    pub fn populate(
        &mut self,
        containing: FilePath,
        resolved: impl IntoIterator<Item = Option<ResolvedDependency>>,
    ) {
        let deps: Vec<ResolvedDependency> = resolved.into_iter().flatten().collect();
        tracing::trace!(file = %containing, edges = deps.len(), "dependency graph entry replaced");
        self.edges.insert(containing, deps);
    }

    /// The imports recorded for `file`.
    pub fn dependencies_of(&self, file: &FilePath) -> &[ResolvedDependency] {
        self.edges.get(file).map_or(&[], Vec::as_slice)
    }

    /// Returns `true` if `file` has been resolved at least once.
    pub fn contains(&self, file: &FilePath) -> bool {
        self.edges.contains_key(file)
    }

    /// Iterates over every `(containing, imports)` entry.
    pub fn iter(&self) -> impl Iterator<Item = (&FilePath, &[ResolvedDependency])> {
        self.edges.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Number of containing files.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Returns `true` if nothing has been resolved.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Imported file to the files importing it. Derived from a [`DependencyGraph`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReverseDependencyGraph {
    edges: HashMap<FilePath, BTreeSet<FilePath>>,
}

impl ReverseDependencyGraph {
    /// Rebuilds the reverse graph from scratch.
    pub fn rebuild(forward: &DependencyGraph) -> Self {
        let mut edges: HashMap<FilePath, BTreeSet<FilePath>> = HashMap::new();
        for (containing, deps) in forward.iter() {
            for dep in deps {
                edges
                    .entry(dep.resolved.clone())
                    .or_default()
                    .insert(containing.clone());
            }
        }
        Self { edges }
    }

    /// Files that import `file` directly.
    pub fn dependants_of(&self, file: &FilePath) -> impl Iterator<Item = &FilePath> {
        self.edges.get(file).into_iter().flatten()
    }
}

/// Every file that transitively imports `file`, including `file` itself.
///
/// Cycles are handled by the visited set.
pub fn collect_all_dependants(
    reverse: &ReverseDependencyGraph,
    file: &FilePath,
) -> BTreeSet<FilePath> {
    let mut collected = BTreeSet::new();
    let mut pending = vec![file.clone()];
    while let Some(next) = pending.pop() {
        if !collected.insert(next.clone()) {
            continue;
        }
        pending.extend(
            reverse
                .dependants_of(&next)
                .filter(|d| !collected.contains(*d))
                .cloned(),
        );
    }
    collected
}
