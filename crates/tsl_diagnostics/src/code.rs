//! Numeric compiler diagnostic codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A compiler diagnostic code, displayed with its `TS` prefix (e.g. `TS2322`).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiagnosticCode(pub u32);

impl DiagnosticCode {
    /// Returns the bare number, as listed in `ignoreDiagnostics`.
    pub fn number(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TS{}", self.0)
    }
}
