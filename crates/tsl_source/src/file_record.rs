//! A single versioned file in the file table.

use crate::path::FilePath;
use std::sync::Arc;
use tsl_common::ContentHash;

/// Where a record's current text came from.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Provenance {
    /// Read from the file system.
    Disk,
    /// Supplied by the host (e.g. the contents handed to the entry point).
    Memory,
}

/// A file known to a compiler instance.
///
/// The version starts at 1 and increases by exactly one on every text change.
/// Setting identical text leaves the version untouched so the compiler can
/// keep its cached parse of the file.
#[derive(Debug, Clone)]
pub struct FileRecord {
    path: FilePath,
    text: Arc<str>,
    version: u64,
    hash: ContentHash,
    /// Byte offsets of each line start (the first entry is always 0).
    line_starts: Vec<u32>,
    provenance: Provenance,
    root: bool,
}

impl FileRecord {
    /// Creates a record at version 1.
    pub fn new(path: FilePath, text: &str, provenance: Provenance) -> Self {
        Self {
            path,
            hash: ContentHash::from_text(text),
            line_starts: compute_line_starts(text),
            text: Arc::from(text),
            version: 1,
            provenance,
            root: false,
        }
    }

    /// The normalized path of this file.
    pub fn path(&self) -> &FilePath {
        &self.path
    }

    /// The current text.
    pub fn text(&self) -> &Arc<str> {
        &self.text
    }

    /// The current version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Hash of the current text.
    pub fn hash(&self) -> ContentHash {
        self.hash
    }

    /// Where the current text came from.
    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    /// Whether this file is a root of the program (from the config file list
    /// or processed by the host) as opposed to a file only reached by resolution.
    pub fn is_root(&self) -> bool {
        self.root
    }

    pub(crate) fn mark_root(&mut self) -> bool {
        !std::mem::replace(&mut self.root, true)
    }

    /// Replaces the text, returning `true` if it differed.
    pub(crate) fn set_text(&mut self, text: &str, provenance: Provenance) -> bool {
        self.provenance = provenance;
        let hash = ContentHash::from_text(text);
        if hash == self.hash && *self.text == *text {
            return false;
        }
        self.hash = hash;
        self.text = Arc::from(text);
        self.line_starts = compute_line_starts(text);
        self.version += 1;
        true
    }

    /// Converts a byte offset into 0-based (line, character) coordinates.
    ///
    /// The column counts `char`s from the line start. Offsets past the end of
    /// the text clamp to the last position; an offset inside a multi-byte
    /// character lands after it.
    pub fn line_col(&self, byte_offset: u32) -> (u32, u32) {
        let offset = byte_offset.min(self.text.len() as u32);
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let line_start = self.line_starts[line_idx] as usize;
        let width = offset as usize - line_start;
        let col = self.text[line_start..]
            .char_indices()
            .take_while(|(i, _)| *i < width)
            .count();
        (line_idx as u32, col as u32)
    }
}

/// Computes the byte offsets of each line start in the given text.
fn compute_line_starts(text: &str) -> Vec<u32> {
    let mut starts = vec![0u32];
    for (i, byte) in text.bytes().enumerate() {
        if byte == b'\n' {
            starts.push((i + 1) as u32);
        }
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::CaseSensitivity;

    fn make(text: &str) -> FileRecord {
        FileRecord::new(
            FilePath::new("/p/a.ts", CaseSensitivity::Sensitive),
            text,
            Provenance::Disk,
        )
    }

    #[test]
    fn line_starts_computation() {
        let f = make("abc\ndef\nghi");
        assert_eq!(f.line_starts, vec![0, 4, 8]);
    }

    #[test]
    fn line_col_is_zero_based() {
        let f = make("abc\ndef\nghi");
        assert_eq!(f.line_col(0), (0, 0));
        assert_eq!(f.line_col(4), (1, 0));
        assert_eq!(f.line_col(5), (1, 1));
        assert_eq!(f.line_col(8), (2, 0));
    }

    #[test]
    fn line_col_clamps_past_end() {
        let f = make("ab\nc");
        assert_eq!(f.line_col(100), (1, 1));
    }

    #[test]
    fn columns_count_characters_not_bytes() {
        // "é" is two bytes, "→" three
        let f = make("let é = 1;\nconst s = \"→\"; x");
        let x = f.text().rfind('x').unwrap() as u32;
        assert_eq!(f.line_col(x), (1, 15));
        let one = f.text().find('1').unwrap() as u32;
        assert_eq!(f.line_col(one), (0, 8));
        let end = f.text().len() as u32;
        assert_eq!(f.line_col(end), (1, 16));
    }

    #[test]
    fn offset_inside_a_character_lands_after_it() {
        let f = make("é;");
        assert_eq!(f.line_col(1), (0, 1));
        assert_eq!(f.line_col(2), (0, 1));
    }

    #[test]
    fn new_record_starts_at_version_one() {
        let f = make("x");
        assert_eq!(f.version(), 1);
        assert!(!f.is_root());
    }

    #[test]
    fn same_text_keeps_version() {
        let mut f = make("let a = 1;");
        assert!(!f.set_text("let a = 1;", Provenance::Memory));
        assert_eq!(f.version(), 1);
        assert_eq!(f.provenance(), Provenance::Memory);
    }

    #[test]
    fn changed_text_bumps_version_once() {
        let mut f = make("let a = 1;");
        assert!(f.set_text("let a = 2;", Provenance::Disk));
        assert_eq!(f.version(), 2);
        assert_eq!(&**f.text(), "let a = 2;");
        assert_eq!(f.hash(), ContentHash::from_text("let a = 2;"));
    }

    #[test]
    fn mark_root_reports_first_transition() {
        let mut f = make("");
        assert!(f.mark_root());
        assert!(!f.mark_root());
        assert!(f.is_root());
    }
}
