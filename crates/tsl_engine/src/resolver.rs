//! Module resolution reconciling the host build with the compiler.

use crate::host::HostResolver;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tsl_compiler::{Compiler, CompilerOptions, ResolvedModule};
use tsl_config::SuffixRules;
use tsl_source::path::{is_declaration_file, normalize};
use tsl_source::FileSystem;

/// Resolves import names for one instance.
///
/// Each name is resolved twice: by the host (so aliases and extension rules
/// configured there apply) and by the compiler (which knows whether the
/// import is an external library). The host's answer is preferred so the
/// compiler analyzes the file the host will bundle.
pub struct ModuleResolver {
    compiler: Arc<dyn Compiler>,
    host: Arc<dyn HostResolver>,
    suffix_rules: SuffixRules,
}

impl ModuleResolver {
    /// Creates a resolver.
    pub fn new(
        compiler: Arc<dyn Compiler>,
        host: Arc<dyn HostResolver>,
        suffix_rules: SuffixRules,
    ) -> Self {
        Self {
            compiler,
            host,
            suffix_rules,
        }
    }

    /// The name the compiler analyzes `path` under, after suffix rules.
    pub fn analyzed_path(&self, path: &Path) -> PathBuf {
        self.suffix_rules
            .apply(path)
            .unwrap_or_else(|| path.to_path_buf())
    }

    /// Resolves every name imported by `containing`, one result per name.
    pub fn resolve_module_names(
        &self,
        names: &[String],
        containing: &Path,
        options: &CompilerOptions,
        fs: &dyn FileSystem,
    ) -> Vec<Option<ResolvedModule>> {
        let extensions = options.script_extensions();
        names
            .iter()
            .map(|name| self.resolve(name, containing, options, fs, &extensions))
            .collect()
    }

    fn resolve(
        &self,
        name: &str,
        containing: &Path,
        options: &CompilerOptions,
        fs: &dyn FileSystem,
        extensions: &[&str],
    ) -> Option<ResolvedModule> {
        let from_host = self.resolve_with_host(name, containing, extensions);
        let from_compiler = self
            .compiler
            .resolve_module_name(name, containing, options, fs)
            .map(|m| {
                let path = normalize(&m.resolved_file_name);
                ResolvedModule::new(path, m.is_external_library_import)
            });

        let resolved = match (from_host, from_compiler) {
            (Some(host), Some(compiler)) => {
                if host.resolved_file_name == compiler.resolved_file_name {
                    Some(ResolvedModule {
                        is_external_library_import: compiler.is_external_library_import,
                        ..host
                    })
                } else if is_js_implementation_of_typings(&host, &compiler) {
                    Some(compiler)
                } else {
                    Some(host)
                }
            }
            (host, compiler) => host.or(compiler),
        };
        if resolved.is_none() {
            tracing::trace!(name = %name, containing = %containing.display(), "module unresolved");
        }
        resolved
    }

    fn resolve_with_host(
        &self,
        name: &str,
        containing: &Path,
        extensions: &[&str],
    ) -> Option<ResolvedModule> {
        let from_dir = normalize(containing.parent().unwrap_or_else(|| Path::new("/")));
        let original = match self.host.resolve_sync(&from_dir, name) {
            Ok(path) => normalize(&path),
            Err(reason) => {
                tracing::trace!(name = %name, %reason, "host resolution failed");
                return None;
            }
        };
        let resolved = self.analyzed_path(&original);
        if !has_script_extension(&resolved, extensions) {
            return None;
        }
        Some(ResolvedModule {
            resolved_file_name: resolved,
            original_file_name: original,
            is_external_library_import: false,
        })
    }
}

impl std::fmt::Debug for ModuleResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleResolver")
            .field("compiler", &self.compiler.name())
            .field("suffix_rules", &self.suffix_rules)
            .finish_non_exhaustive()
    }
}

fn has_script_extension(path: &Path, extensions: &[&str]) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    extensions.iter().any(|ext| {
        name.strip_suffix(ext)
            .and_then(|stem| stem.strip_suffix('.'))
            .is_some_and(|stem| !stem.is_empty())
    })
}

/// The host picked `x.js` where the compiler found the typings `x.d.ts`.
fn is_js_implementation_of_typings(host: &ResolvedModule, compiler: &ResolvedModule) -> bool {
    host.resolved_file_name.to_string_lossy().ends_with("js")
        && is_declaration_file(&compiler.resolved_file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tsl_compiler::{CompilerError, CompilerSession, ParsedCommandLine, TranspileOutput};
    use tsl_config::{LoaderOptions, ProjectConfigFile};
    use tsl_source::{FilePath, MemoryFileSystem};

    struct TableCompiler(HashMap<String, ResolvedModule>);

    impl Compiler for TableCompiler {
        fn name(&self) -> &str {
            "table"
        }
        fn version(&self) -> &str {
            "0"
        }
        fn parse_config(
            &self,
            _: &ProjectConfigFile,
            _: &Path,
            _: &dyn FileSystem,
        ) -> Result<ParsedCommandLine, CompilerError> {
            Ok(ParsedCommandLine::default())
        }
        fn create_session(&self, _: &CompilerOptions) -> Box<dyn CompilerSession> {
            unimplemented!()
        }
        fn resolve_module_name(
            &self,
            name: &str,
            _: &Path,
            _: &CompilerOptions,
            _: &dyn FileSystem,
        ) -> Option<ResolvedModule> {
            self.0.get(name).cloned()
        }
        fn transpile_module(&self, _: &str, _: &FilePath, _: &CompilerOptions) -> TranspileOutput {
            TranspileOutput::default()
        }
    }

    struct TableHost(HashMap<String, PathBuf>);

    impl HostResolver for TableHost {
        fn resolve_sync(&self, _: &Path, request: &str) -> Result<PathBuf, String> {
            self.0
                .get(request)
                .cloned()
                .ok_or_else(|| format!("Can't resolve '{request}'"))
        }
    }

    fn resolver(
        host: &[(&str, &str)],
        compiler: &[(&str, &str, bool)],
        suffix: &[&str],
    ) -> ModuleResolver {
        let host = host
            .iter()
            .map(|(n, p)| (n.to_string(), PathBuf::from(p)))
            .collect();
        let compiler = compiler
            .iter()
            .map(|(n, p, ext)| (n.to_string(), ResolvedModule::new(*p, *ext)))
            .collect();
        let options = LoaderOptions {
            append_ts_suffix_to: suffix.iter().map(|s| s.to_string()).collect(),
            ..LoaderOptions::default()
        };
        ModuleResolver::new(
            Arc::new(TableCompiler(compiler)),
            Arc::new(TableHost(host)),
            SuffixRules::compile(&options).unwrap(),
        )
    }

    fn resolve(resolver: &ModuleResolver, names: &[&str]) -> Vec<Option<ResolvedModule>> {
        let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        resolver.resolve_module_names(
            &names,
            Path::new("/p/src/app.ts"),
            &CompilerOptions::default(),
            &MemoryFileSystem::new(),
        )
    }

    #[test]
    fn agreement_keeps_host_path_and_compiler_flag() {
        let r = resolver(
            &[("react", "/p/node_modules/react/index.d.ts")],
            &[("react", "/p/node_modules/react/index.d.ts", true)],
            &[],
        );
        let resolved = resolve(&r, &["react"]).remove(0).unwrap();
        assert_eq!(resolved.original_file_name, PathBuf::from("/p/node_modules/react/index.d.ts"));
        assert!(resolved.is_external_library_import);
    }

    #[test]
    fn only_one_side_resolving_is_used() {
        let r = resolver(
            &[("@app/lib", "/p/src/lib.ts")],
            &[("./util", "/p/src/util.ts", false)],
            &[],
        );
        let results = resolve(&r, &["@app/lib", "./util", "missing-pkg"]);
        assert_eq!(
            results[0].as_ref().map(|m| m.resolved_file_name.clone()),
            Some(PathBuf::from("/p/src/lib.ts"))
        );
        assert_eq!(
            results[1].as_ref().map(|m| m.resolved_file_name.clone()),
            Some(PathBuf::from("/p/src/util.ts"))
        );
        assert!(results[2].is_none());
    }

    #[test]
    fn disagreement_prefers_host() {
        let r = resolver(
            &[("./lib", "/p/src/aliased/lib.ts")],
            &[("./lib", "/p/src/lib.ts", false)],
            &[],
        );
        let resolved = resolve(&r, &["./lib"]).remove(0).unwrap();
        assert_eq!(resolved.resolved_file_name, PathBuf::from("/p/src/aliased/lib.ts"));
    }

    #[test]
    fn typings_beat_js_implementation() {
        let r = resolver(
            &[("pkg", "/p/node_modules/pkg/index.js")],
            &[("pkg", "/p/node_modules/pkg/index.d.ts", true)],
            &[],
        );
        // .js is not a script without allowJs, so the compiler result stands alone.
        let resolved = resolve(&r, &["pkg"]).remove(0).unwrap();
        assert_eq!(resolved.resolved_file_name, PathBuf::from("/p/node_modules/pkg/index.d.ts"));

        let host = ResolvedModule::new("/p/node_modules/pkg/index.js", false);
        let compiler = ResolvedModule::new("/p/node_modules/pkg/index.d.ts", true);
        assert!(is_js_implementation_of_typings(&host, &compiler));
    }

    #[test]
    fn non_script_host_result_is_ignored() {
        let r = resolver(&[("./styles.css", "/p/src/styles.css")], &[], &[]);
        assert!(resolve(&r, &["./styles.css"])[0].is_none());
    }

    #[test]
    fn suffix_rule_makes_host_result_a_script() {
        let r = resolver(&[("./App.vue", "/p/src/App.vue")], &[], &[r"\.vue$"]);
        let resolved = resolve(&r, &["./App.vue"]).remove(0).unwrap();
        assert_eq!(resolved.resolved_file_name, PathBuf::from("/p/src/App.vue.ts"));
        assert_eq!(resolved.original_file_name, PathBuf::from("/p/src/App.vue"));
    }

    #[test]
    fn script_extension_check() {
        let ts = ["ts", "tsx", "d.ts"];
        assert!(has_script_extension(Path::new("/p/a.ts"), &ts));
        assert!(has_script_extension(Path::new("/p/a.d.ts"), &ts));
        assert!(!has_script_extension(Path::new("/p/a.css"), &ts));
        assert!(!has_script_extension(Path::new("/p/ts"), &ts));
        assert!(!has_script_extension(Path::new("/p/ats"), &ts));
    }
}
