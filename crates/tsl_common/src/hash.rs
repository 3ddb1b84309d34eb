//! Content hashing for text-change detection in the file table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// XXH3-128 digest of a file's text.
///
/// Two texts with the same `ContentHash` are assumed to be identical. The file
/// table compares hashes before comparing text so that re-reading an unchanged
/// file on every watch notification stays cheap.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(u128);

impl ContentHash {
    /// Hashes UTF-8 source text.
    pub fn from_text(text: &str) -> Self {
        Self(xxhash_rust::xxh3::xxh3_128(text.as_bytes()))
    }

    /// The raw digest.
    pub fn as_u128(self) -> u128 {
        self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:08x}..)", self.0 >> 96)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_text_same_hash() {
        let a = ContentHash::from_text("export const a = 1;");
        let b = ContentHash::from_text("export const a = 1;");
        assert_eq!(a, b);
    }

    #[test]
    fn trailing_space_is_a_change() {
        let a = ContentHash::from_text("let x = 1;");
        let b = ContentHash::from_text("let x = 1; ");
        assert_ne!(a, b);
    }

    #[test]
    fn display_is_full_width_hex() {
        let shown = ContentHash::from_text("").to_string();
        assert_eq!(shown.len(), 32);
        assert!(shown.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn debug_is_abbreviated() {
        let shown = format!("{:?}", ContentHash::from_text("app.ts"));
        assert!(shown.starts_with("ContentHash("));
        assert_eq!(shown.len(), "ContentHash(..)".len() + 8);
    }

    #[test]
    fn serializes_as_the_digest() {
        let h = ContentHash::from_text("lib.ts");
        let json = serde_json::to_string(&h).expect("serializable");
        assert_eq!(json, h.as_u128().to_string());
        let back: ContentHash = serde_json::from_str(&json).expect("deserializable");
        assert_eq!(back.as_u128(), h.as_u128());
    }
}
