//! Change propagation between compilation rounds.

use crate::graph::{collect_all_dependants, ReverseDependencyGraph};
use std::collections::BTreeSet;
use tsl_source::{FilePath, FileTable};

/// Where an instance is in its round cycle.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum RoundState {
    /// No changes since the last round.
    #[default]
    Idle,
    /// Files changed; the next round has work to do.
    Dirty,
    /// The re-check set was computed and diagnostics are being collected.
    Checked,
}

/// Tracks modified and errored files to compute each round's re-check set.
#[derive(Debug, Default, Clone)]
pub struct ChangeTracker {
    state: RoundState,

    /// Files whose text changed since the last round.
    modified: BTreeSet<FilePath>,

    /// Files that had diagnostics reported in the last round.
    errored: BTreeSet<FilePath>,

    /// Number of completed rounds.
    generation: u64,
}

impl ChangeTracker {
    /// Creates a tracker for a fresh instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `file`'s text changed.
    pub fn record_change(&mut self, file: FilePath) {
        self.modified.insert(file);
        self.state = RoundState::Dirty;
    }

    /// Returns `true` until the first round has finished.
    pub fn is_first_round(&self) -> bool {
        self.generation == 0
    }

    /// Computes the files to re-validate this round.
    ///
    /// The first round checks every file in the table. Later rounds check
    /// the dependants of every modified file plus every file that had
    /// diagnostics last round.
    pub fn recheck_set(
        &mut self,
        files: &FileTable,
        reverse: &ReverseDependencyGraph,
    ) -> BTreeSet<FilePath> {
        self.state = RoundState::Checked;
        if self.is_first_round() {
            return files.paths().into_iter().collect();
        }
        let mut set: BTreeSet<FilePath> = self.errored.clone();
        for file in &self.modified {
            set.extend(collect_all_dependants(reverse, file));
        }
        set
    }

    /// Completes the round with the files that had diagnostics.
    pub fn finish_round(&mut self, errored: BTreeSet<FilePath>) {
        self.errored = errored;
        self.modified.clear();
        self.generation += 1;
        self.state = RoundState::Idle;
    }

    /// Current state.
    pub fn state(&self) -> RoundState {
        self.state
    }

    /// Files modified since the last round.
    pub fn modified(&self) -> &BTreeSet<FilePath> {
        &self.modified
    }

    /// Files with diagnostics in the last round.
    pub fn errored(&self) -> &BTreeSet<FilePath> {
        &self.errored
    }

    /// Number of completed rounds.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DependencyGraph, ResolvedDependency};
    use std::path::PathBuf;
    use tsl_source::{CaseSensitivity, Provenance};

    fn key(name: &str) -> FilePath {
        FilePath::new(format!("/p/{name}"), CaseSensitivity::Sensitive)
    }

    fn dep(name: &str) -> Option<ResolvedDependency> {
        Some(ResolvedDependency {
            resolved: key(name),
            original: PathBuf::from(format!("/p/{name}")),
            is_external_library_import: false,
        })
    }

    /// c imports b imports a.
    fn chain() -> (FileTable, ReverseDependencyGraph) {
        let mut files = FileTable::new(CaseSensitivity::Sensitive);
        for name in ["a.ts", "b.ts", "c.ts"] {
            files.update_text(&key(name), "", Provenance::Memory);
        }
        let mut graph = DependencyGraph::new();
        graph.populate(key("b.ts"), [dep("a.ts")]);
        graph.populate(key("c.ts"), [dep("b.ts")]);
        (files, ReverseDependencyGraph::rebuild(&graph))
    }

    fn set(names: &[&str]) -> BTreeSet<FilePath> {
        names.iter().map(|n| key(n)).collect()
    }

    #[test]
    fn first_round_checks_everything() {
        let (files, reverse) = chain();
        let mut tracker = ChangeTracker::new();
        assert!(tracker.is_first_round());
        assert_eq!(tracker.recheck_set(&files, &reverse), set(&["a.ts", "b.ts", "c.ts"]));
        assert_eq!(tracker.state(), RoundState::Checked);
    }

    #[test]
    fn editing_leaf_importer_rechecks_only_it() {
        let (files, reverse) = chain();
        let mut tracker = ChangeTracker::new();
        tracker.recheck_set(&files, &reverse);
        tracker.finish_round(BTreeSet::new());

        tracker.record_change(key("c.ts"));
        assert_eq!(tracker.state(), RoundState::Dirty);
        assert_eq!(tracker.recheck_set(&files, &reverse), set(&["c.ts"]));
    }

    #[test]
    fn editing_base_rechecks_all_dependants() {
        let (files, reverse) = chain();
        let mut tracker = ChangeTracker::new();
        tracker.recheck_set(&files, &reverse);
        tracker.finish_round(BTreeSet::new());

        tracker.record_change(key("a.ts"));
        assert_eq!(tracker.recheck_set(&files, &reverse), set(&["a.ts", "b.ts", "c.ts"]));
    }

    #[test]
    fn previously_errored_files_are_rechecked() {
        let (files, reverse) = chain();
        let mut tracker = ChangeTracker::new();
        tracker.recheck_set(&files, &reverse);
        tracker.finish_round(set(&["a.ts"]));

        tracker.record_change(key("c.ts"));
        assert_eq!(tracker.recheck_set(&files, &reverse), set(&["a.ts", "c.ts"]));
    }

    #[test]
    fn finish_round_resets() {
        let (files, reverse) = chain();
        let mut tracker = ChangeTracker::new();
        tracker.record_change(key("b.ts"));
        tracker.recheck_set(&files, &reverse);
        tracker.finish_round(set(&["b.ts"]));
        assert_eq!(tracker.generation(), 1);
        assert!(tracker.modified().is_empty());
        assert_eq!(tracker.errored(), &set(&["b.ts"]));
        assert_eq!(tracker.state(), RoundState::Idle);

        // Nothing modified and nothing errored: nothing to do.
        tracker.finish_round(BTreeSet::new());
        assert!(tracker.recheck_set(&files, &reverse).is_empty());
    }
}
