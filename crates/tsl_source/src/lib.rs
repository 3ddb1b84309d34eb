//! The file table: normalized paths, versioned in-memory text, and line indexing.
//!
//! This crate provides the [`FileTable`] that every compiler instance owns,
//! the [`FilePath`] key type with its case-sensitivity policy, the
//! [`FileSystem`] capability used to read files from disk, and
//! [`ResolvedSpan`] for turning compiler byte offsets into 1-based
//! line/column coordinates.

#![warn(missing_docs)]

pub mod file_record;
pub mod file_table;
pub mod fs;
pub mod path;
pub mod resolved_span;
pub mod span;

pub use file_record::{FileRecord, Provenance};
pub use file_table::{FileTable, TextUpdate};
pub use fs::{FileSystem, MemoryFileSystem, OsFileSystem};
pub use path::{CaseSensitivity, FilePath};
pub use resolved_span::ResolvedSpan;
pub use span::TextSpan;
