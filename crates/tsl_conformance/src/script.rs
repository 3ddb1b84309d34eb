//! The line-oriented mini language understood by [`ScriptCompiler`](crate::ScriptCompiler).
//!
//! ```text
//! import { a, b } from "./lib";    // named imports
//! import "./side-effect";          // bare import
//! export const a = 1;              // exports `a` (also `function`, `type`, `interface`, `class`)
//! let x = 1; // @syntax-error      // TS1005 at the marker
//! let y = 1; // @type-error        // TS2322 at the marker
//! let z = 1; // @warn              // warning TS6133 at the marker
//! ```

use std::collections::BTreeSet;

/// One `import` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Imported binding names, empty for bare imports.
    pub names: Vec<String>,
    /// The module specifier.
    pub specifier: String,
    /// Byte offset of the specifier text.
    pub offset: u32,
}

/// Kinds of inline problem markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// `@syntax-error`
    SyntaxError,
    /// `@type-error`
    TypeError,
    /// `@warn`
    Warning,
}

/// An inline problem marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    /// What the marker produces.
    pub kind: MarkerKind,
    /// Byte offset of the `@`.
    pub offset: u32,
    /// Length of the marker text.
    pub len: u32,
}

/// Everything the compiler needs from one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedScript {
    /// Imports in source order.
    pub imports: Vec<Import>,
    /// Exported names.
    pub exports: BTreeSet<String>,
    /// Problem markers in source order.
    pub markers: Vec<Marker>,
}

impl ParsedScript {
    /// Returns `true` if the file neither imports nor exports anything.
    pub fn is_global_script(&self) -> bool {
        self.imports.is_empty() && self.exports.is_empty()
    }
}

const MARKERS: [(&str, MarkerKind); 3] = [
    ("@syntax-error", MarkerKind::SyntaxError),
    ("@type-error", MarkerKind::TypeError),
    ("@warn", MarkerKind::Warning),
];

const EXPORT_KEYWORDS: [&str; 6] = ["const", "let", "function", "class", "type", "interface"];

/// Parses script text.
pub fn parse(text: &str) -> ParsedScript {
    let mut parsed = ParsedScript::default();
    let mut line_start = 0usize;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with("import ") || trimmed.starts_with("import\"") {
            if let Some(import) = parse_import(line, line_start) {
                parsed.imports.push(import);
            }
        } else if let Some(rest) = trimmed.strip_prefix("export ") {
            if let Some(name) = exported_name(rest) {
                parsed.exports.insert(name);
            }
        }
        for (marker, kind) in MARKERS {
            if let Some(col) = line.find(marker) {
                parsed.markers.push(Marker {
                    kind,
                    offset: (line_start + col) as u32,
                    len: marker.len() as u32,
                });
            }
        }
        line_start += line.len();
    }
    parsed
}

fn parse_import(line: &str, line_start: usize) -> Option<Import> {
    let open = line.find('"')?;
    let close = open + 1 + line[open + 1..].find('"')?;
    let specifier = line[open + 1..close].to_string();
    let names = match (line.find('{'), line.find('}')) {
        (Some(start), Some(end)) if start < end && end < open => line[start + 1..end]
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };
    Some(Import {
        names,
        specifier,
        offset: (line_start + open + 1) as u32,
    })
}

fn exported_name(rest: &str) -> Option<String> {
    let mut words = rest.split_whitespace();
    let keyword = words.next()?;
    if !EXPORT_KEYWORDS.iter().any(|k| *k == keyword) {
        return None;
    }
    let name: String = words
        .next()?
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '$')
        .collect();
    (!name.is_empty()).then_some(name)
}
