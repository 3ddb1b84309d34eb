//! Loader options and project configuration resolution.
//!
//! Loader options arrive as partial layers (defaults, an optional `tsl.toml`
//! options file, host-supplied overrides) and are merged into one strongly
//! typed [`LoaderOptions`]. The project configuration file is located by
//! explicit path or by searching upward, parsed as JSON with comments, and
//! combined with the host's compiler-option overrides into a
//! [`ResolvedConfig`].

#![warn(missing_docs)]

pub mod error;
pub mod locate;
pub mod options;
pub mod project;
pub mod resolve;
pub mod suffix;

pub use error::ConfigError;
pub use locate::{find_config_file, ConfigSpec};
pub use options::{LoaderOptions, LoaderOptionsLayer};
pub use project::{parse_project_config, ProjectConfigFile, ProjectReference};
pub use resolve::{resolve_config, ResolvedConfig};
pub use suffix::SuffixRules;
