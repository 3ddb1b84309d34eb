//! Suffix rules applied to resolved module paths.

use crate::error::ConfigError;
use crate::options::LoaderOptions;
use regex::Regex;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
struct SuffixRule {
    suffix: &'static str,
    pattern: Regex,
}

/// Compiled `appendTsSuffixTo` and `appendTsxSuffixTo` patterns.
///
/// `.ts` patterns are tried before `.tsx` patterns and the first match wins.
#[derive(Debug, Clone, Default)]
pub struct SuffixRules {
    rules: Vec<SuffixRule>,
}

impl SuffixRules {
    /// Compiles the suffix patterns from the loader options.
    pub fn compile(options: &LoaderOptions) -> Result<Self, ConfigError> {
        let mut rules = Vec::new();
        for (option, suffix, patterns) in [
            ("appendTsSuffixTo", ".ts", &options.append_ts_suffix_to),
            ("appendTsxSuffixTo", ".tsx", &options.append_tsx_suffix_to),
        ] {
            for pattern in patterns {
                let compiled = Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
                    option,
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })?;
                rules.push(SuffixRule {
                    suffix,
                    pattern: compiled,
                });
            }
        }
        Ok(Self { rules })
    }

    /// Returns `true` if no patterns are configured.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Appends the suffix of the first matching rule, if any.
    pub fn apply(&self, path: &Path) -> Option<PathBuf> {
        let text = path.to_string_lossy();
        let rule = self.rules.iter().find(|r| r.pattern.is_match(&text))?;
        let mut out = path.as_os_str().to_owned();
        out.push(rule.suffix);
        Some(PathBuf::from(out))
    }
}
