//! Byte-offset ranges reported by the compiler.

use serde::{Deserialize, Serialize};

/// A byte range within one file, as reported by the compiler (0-based start).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct TextSpan {
    /// Byte offset of the start of the span (inclusive).
    pub start: u32,
    /// Length of the span in bytes.
    pub length: u32,
}

impl TextSpan {
    /// Creates a span from a start offset and a length.
    pub fn new(start: u32, length: u32) -> Self {
        Self { start, length }
    }

    /// Returns the exclusive end offset.
    pub fn end(&self) -> u32 {
        self.start.saturating_add(self.length)
    }

    /// Returns `true` if this span has zero length.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}
