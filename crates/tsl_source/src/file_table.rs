//! The per-instance table of every file the compiler has seen.

use crate::file_record::{FileRecord, Provenance};
use crate::fs::FileSystem;
use crate::path::{CaseSensitivity, FilePath};
use crate::resolved_span::ResolvedSpan;
use crate::span::TextSpan;
use std::collections::HashMap;
use std::path::Path;
use tsl_common::{InternalError, TslResult};

/// Outcome of writing text into the table.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TextUpdate {
    /// The file was not known before; a record was created at version 1.
    Created,
    /// The text differed; the version was bumped to the contained value.
    Changed(u64),
    /// The text was identical; nothing changed.
    Unchanged,
}

impl TextUpdate {
    /// Returns `true` if the compiler must see a new version of the file.
    pub fn is_change(self) -> bool {
        !matches!(self, TextUpdate::Unchanged)
    }
}

/// Mapping from normalized path to versioned text.
///
/// Records are created on first reference and never removed during a
/// session, so the compiler always sees a stable file universe.
#[derive(Debug, Default)]
pub struct FileTable {
    case: CaseSensitivity,
    files: HashMap<FilePath, FileRecord>,
}

impl FileTable {
    /// Creates an empty table using the given case policy for keys.
    pub fn new(case: CaseSensitivity) -> Self {
        Self {
            case,
            files: HashMap::new(),
        }
    }

    /// The case policy used to build keys.
    pub fn case(&self) -> CaseSensitivity {
        self.case
    }

    /// Builds the key for `path` under this table's case policy.
    pub fn key(&self, path: impl AsRef<Path>) -> FilePath {
        FilePath::new(path, self.case)
    }

    /// Returns the record for `path`, if known.
    pub fn get(&self, path: &FilePath) -> Option<&FileRecord> {
        self.files.get(path)
    }

    /// Returns the record for `path`, or an internal error if it is missing.
    ///
    /// Used where the engine has just created the record and its absence
    /// would mean the table is corrupt.
    pub fn record(&self, path: &FilePath) -> TslResult<&FileRecord> {
        self.files
            .get(path)
            .ok_or_else(|| InternalError::new(format!("no file record for {path}")))
    }

    /// Returns `true` if `path` has a record.
    pub fn contains(&self, path: &FilePath) -> bool {
        self.files.contains_key(path)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if the table has no records.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Returns the version of `path`, if known.
    pub fn version(&self, path: &FilePath) -> Option<u64> {
        self.files.get(path).map(FileRecord::version)
    }

    /// Iterates over all records in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &FileRecord> {
        self.files.values()
    }

    /// All known paths, sorted by key.
    pub fn paths(&self) -> Vec<FilePath> {
        let mut paths: Vec<FilePath> = self.files.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Paths of the program's root files, sorted by key.
    pub fn root_paths(&self) -> Vec<FilePath> {
        let mut paths: Vec<FilePath> = self
            .files
            .values()
            .filter(|r| r.is_root())
            .map(|r| r.path().clone())
            .collect();
        paths.sort();
        paths
    }

    /// Writes `text` for `path`, creating the record if needed.
    ///
    /// The version is bumped only when the text actually differs.
    pub fn update_text(&mut self, path: &FilePath, text: &str, provenance: Provenance) -> TextUpdate {
        match self.files.get_mut(path) {
            Some(record) => {
                if record.set_text(text, provenance) {
                    TextUpdate::Changed(record.version())
                } else {
                    TextUpdate::Unchanged
                }
            }
            None => {
                self.files
                    .insert(path.clone(), FileRecord::new(path.clone(), text, provenance));
                TextUpdate::Created
            }
        }
    }

    /// Marks `path` as a program root, returning `true` if it was not one before.
    ///
    /// Does nothing for unknown paths.
    pub fn mark_root(&mut self, path: &FilePath) -> bool {
        self.files.get_mut(path).is_some_and(FileRecord::mark_root)
    }

    /// Returns the record for `path`, reading it from disk on first reference.
    ///
    /// Returns `None` if the file is unknown and cannot be read.
    pub fn load(&mut self, fs: &dyn FileSystem, path: &FilePath) -> Option<&FileRecord> {
        if !self.files.contains_key(path) {
            let text = fs.read_file(path.as_path())?;
            tracing::trace!(path = %path, "loaded file from disk");
            self.files
                .insert(path.clone(), FileRecord::new(path.clone(), &text, Provenance::Disk));
        }
        self.files.get(path)
    }

    /// Re-reads a known file from disk.
    ///
    /// Returns `None` if the path has no record or can no longer be read; in
    /// that case the previous text is kept.
    pub fn reload(&mut self, fs: &dyn FileSystem, path: &FilePath) -> Option<TextUpdate> {
        let record = self.files.get_mut(path)?;
        let text = fs.read_file(path.as_path())?;
        if record.set_text(&text, Provenance::Disk) {
            Some(TextUpdate::Changed(record.version()))
        } else {
            Some(TextUpdate::Unchanged)
        }
    }

    /// Resolves a compiler span in `path` to 1-based line/column coordinates.
    pub fn resolve_span(&self, path: &FilePath, span: TextSpan) -> Option<ResolvedSpan> {
        let record = self.files.get(path)?;
        let (start_line, start_col) = record.line_col(span.start);
        let (end_line, end_col) = record.line_col(span.end());
        Some(ResolvedSpan {
            file_path: path.as_path().to_path_buf(),
            start_line: start_line + 1,
            start_col: start_col + 1,
            end_line: end_line + 1,
            end_col: end_col + 1,
        })
    }
}
