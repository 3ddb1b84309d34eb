//! Interfaces to the external compiler the engine drives.
//!
//! The engine never parses or type-checks source itself. It talks to a
//! [`Compiler`] (configuration parsing, module resolution, single-file
//! transpilation) and to the incremental [`CompilerSession`] it creates. The
//! session calls back into a [`CompilerHost`] for file text, versions, and
//! module resolution, which is where the engine keeps its file table and
//! dependency graph current.

#![warn(missing_docs)]

pub mod compiler;
pub mod error;
pub mod host;
pub mod options;
pub mod types;

pub use compiler::{Compiler, CompilerSession};
pub use error::CompilerError;
pub use host::CompilerHost;
pub use options::CompilerOptions;
pub use types::{EmitOutput, OutputFile, ParsedCommandLine, ResolvedModule, TranspileOutput};
