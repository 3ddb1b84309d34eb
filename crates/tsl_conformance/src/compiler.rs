//! `ScriptCompiler`: a deterministic compiler for the mini language in [`crate::script`].
//!
//! It implements the whole compiler capability the engine depends on:
//! configuration parsing with option validation, node-style module
//! resolution, an incremental session that re-parses a file only when its
//! version changes, emit with source maps and declarations, and isolated
//! transpilation.

use crate::script::{parse, MarkerKind, ParsedScript};
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tsl_compiler::{
    Compiler, CompilerError, CompilerHost, CompilerOptions, CompilerSession, EmitOutput,
    OutputFile, ParsedCommandLine, ResolvedModule, TranspileOutput,
};
use tsl_config::{parse_project_config, ProjectConfigFile};
use tsl_diagnostics::Diagnostic;
use tsl_source::path::{is_declaration_file, normalize};
use tsl_source::{FilePath, FileSystem, TextSpan};

/// Options the compiler accepts.
const KNOWN_OPTIONS: [&str; 17] = [
    "target",
    "module",
    "moduleResolution",
    "strict",
    "declaration",
    "declarationDir",
    "sourceMap",
    "allowJs",
    "outDir",
    "noEmit",
    "isolatedModules",
    "jsx",
    "lib",
    "types",
    "baseUrl",
    "skipLibCheck",
    "esModuleInterop",
];

const BOOLEAN_OPTIONS: [&str; 8] = [
    "strict",
    "declaration",
    "sourceMap",
    "allowJs",
    "noEmit",
    "isolatedModules",
    "skipLibCheck",
    "esModuleInterop",
];

const PATH_OPTIONS: [&str; 3] = ["outDir", "declarationDir", "baseUrl"];

/// Shared record of the files a session type-checked, in check order.
#[derive(Debug, Clone, Default)]
pub struct CheckLog(Arc<Mutex<Vec<PathBuf>>>);

impl CheckLog {
    fn push(&self, path: PathBuf) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).push(path);
    }

    /// Removes and returns the recorded paths, sorted and deduplicated.
    pub fn take(&self) -> Vec<PathBuf> {
        let mut paths = std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner));
        paths.sort();
        paths.dedup();
        paths
    }
}

/// The scripted compiler.
#[derive(Debug, Clone)]
pub struct ScriptCompiler {
    name: String,
    version: String,
    log: CheckLog,
}

impl Default for ScriptCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptCompiler {
    /// A compiler registered as `typescript`.
    pub fn new() -> Self {
        Self::named("typescript")
    }

    /// A compiler registered under `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: "5.4.5-script".to_string(),
            log: CheckLog::default(),
        }
    }

    /// The log every session of this compiler records semantic checks in.
    pub fn check_log(&self) -> CheckLog {
        self.log.clone()
    }

    fn validate_options(
        &self,
        options: &Map<String, Value>,
        base_dir: &Path,
        errors: &mut Vec<Diagnostic>,
    ) -> CompilerOptions {
        let mut normalized = CompilerOptions::default();
        for (key, value) in options {
            if !KNOWN_OPTIONS.iter().any(|k| *k == key) {
                errors.push(Diagnostic::error(
                    5023,
                    format!("Unknown compiler option '{key}'."),
                ));
                continue;
            }
            if BOOLEAN_OPTIONS.iter().any(|k| *k == key) && !value.is_boolean() {
                errors.push(Diagnostic::error(
                    5024,
                    format!("Compiler option '{key}' requires a value of type boolean."),
                ));
                continue;
            }
            let value = match (PATH_OPTIONS.iter().any(|k| *k == key), value.as_str()) {
                (true, Some(dir)) => {
                    Value::String(normalize(&base_dir.join(dir)).to_string_lossy().into_owned())
                }
                _ => value.clone(),
            };
            normalized.set(key.clone(), value);
        }
        normalized
    }

    fn load_extended(
        &self,
        config: &ProjectConfigFile,
        base_dir: &Path,
        fs: &dyn FileSystem,
    ) -> Result<Map<String, Value>, CompilerError> {
        let Some(extends) = &config.extends else {
            return Ok(config.compiler_options.clone());
        };
        let path = normalize(&base_dir.join(extends));
        let text = fs
            .read_file(&path)
            .ok_or_else(|| CompilerError::Unreadable { path: path.clone() })?;
        let base = parse_project_config(&text, &path).map_err(|e| CompilerError::InvalidConfig {
            compiler: self.name.clone(),
            reason: e.to_string(),
        })?;
        let mut merged = base.compiler_options;
        for (key, value) in &config.compiler_options {
            merged.insert(key.clone(), value.clone());
        }
        Ok(merged)
    }
}

impl Compiler for ScriptCompiler {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn parse_config(
        &self,
        config: &ProjectConfigFile,
        base_dir: &Path,
        fs: &dyn FileSystem,
    ) -> Result<ParsedCommandLine, CompilerError> {
        let raw = self.load_extended(config, base_dir, fs)?;
        let mut errors = Vec::new();
        let options = self.validate_options(&raw, base_dir, &mut errors);

        let listed = config
            .files
            .iter()
            .flatten()
            .chain(config.include.iter().flatten().filter(|p| has_script_name(p)));
        let file_names = listed.map(|f| normalize(&base_dir.join(f))).collect();

        let project_references = config
            .references
            .iter()
            .map(|r| {
                let path = normalize(&base_dir.join(&r.path));
                if path.extension().is_some_and(|e| e == "json") {
                    path
                } else {
                    path.join("tsconfig.json")
                }
            })
            .collect();

        Ok(ParsedCommandLine {
            options,
            file_names,
            project_references,
            errors,
        })
    }

    fn create_session(&self, options: &CompilerOptions) -> Box<dyn CompilerSession> {
        Box::new(ScriptSession {
            options: options.clone(),
            program: HashMap::new(),
            log: self.log.clone(),
        })
    }

    fn resolve_module_name(
        &self,
        name: &str,
        containing: &Path,
        options: &CompilerOptions,
        fs: &dyn FileSystem,
    ) -> Option<ResolvedModule> {
        let from_dir = containing.parent().unwrap_or_else(|| Path::new("/"));
        let found = if is_relative(name) {
            resolve_relative(&normalize(&from_dir.join(name)), options, fs)
        } else {
            resolve_package(name, from_dir, fs)
        }?;
        let external = found.components().any(|c| c.as_os_str() == "node_modules");
        Some(ResolvedModule::new(found, external))
    }

    fn transpile_module(
        &self,
        text: &str,
        file: &FilePath,
        options: &CompilerOptions,
    ) -> TranspileOutput {
        let parsed = parse(text);
        let mut diagnostics = syntax_diagnostics(&parsed, file);
        if options.isolated_modules() && parsed.is_global_script() {
            let name = file
                .as_path()
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            diagnostics.push(
                Diagnostic::error(
                    1208,
                    format!(
                        "'{name}' cannot be compiled under '--isolatedModules' because it is \
                         considered a global script file."
                    ),
                )
                .in_file(file.clone()),
            );
        }
        if file.is_declaration() {
            return TranspileOutput {
                output_text: None,
                source_map_text: None,
                diagnostics,
            };
        }
        let js_name = output_path(file.as_path(), None, "js");
        TranspileOutput {
            output_text: Some(javascript(text, &js_name, options.source_map())),
            source_map_text: options
                .source_map()
                .then(|| source_map(&js_name, file.as_path())),
            diagnostics,
        }
    }
}

struct ProgramFile {
    version: u64,
    parsed: ParsedScript,
    resolutions: Vec<Option<ResolvedModule>>,
}

/// Incremental session. Files are re-parsed and their imports re-resolved
/// only when the host reports a new version.
struct ScriptSession {
    options: CompilerOptions,
    program: HashMap<FilePath, ProgramFile>,
    log: CheckLog,
}

impl ScriptSession {
    /// Brings every file reachable from the roots up to date.
    fn sync(&mut self, host: &mut dyn CompilerHost) {
        let mut pending = host.root_file_names();
        let mut seen = HashSet::new();
        while let Some(path) = pending.pop() {
            if !seen.insert(host.key(&path)) {
                continue;
            }
            if let Some(file) = self.refresh(host, &path) {
                pending.extend(
                    file.resolutions
                        .iter()
                        .flatten()
                        .map(|r| r.resolved_file_name.clone()),
                );
            }
        }
    }

    fn refresh(&mut self, host: &mut dyn CompilerHost, path: &Path) -> Option<&ProgramFile> {
        let key = host.key(path);
        let text = host.script_text(path)?;
        let version = host.script_version(path)?;
        let stale = self
            .program
            .get(&key)
            .map_or(true, |file| file.version != version);
        if stale {
            let parsed = parse(&text);
            let names: Vec<String> = parsed.imports.iter().map(|i| i.specifier.clone()).collect();
            let resolutions = host.resolve_module_names(&names, path);
            tracing::trace!(path = %path.display(), version, imports = names.len(), "reparsed");
            self.program.insert(
                key.clone(),
                ProgramFile {
                    version,
                    parsed,
                    resolutions,
                },
            );
        }
        self.program.get(&key)
    }
}

impl CompilerSession for ScriptSession {
    fn options_diagnostics(&mut self, _host: &mut dyn CompilerHost) -> Vec<Diagnostic> {
        let target = self.options.get("target").and_then(Value::as_str);
        match target {
            Some(t) if t.eq_ignore_ascii_case("es3") => vec![Diagnostic::warning(
                5107,
                "Option 'target=ES3' is deprecated and will stop functioning in a future release.",
            )],
            _ => Vec::new(),
        }
    }

    fn syntactic_diagnostics(
        &mut self,
        host: &mut dyn CompilerHost,
        file: &Path,
    ) -> Vec<Diagnostic> {
        self.sync(host);
        let key = host.key(file);
        match self.refresh(host, file) {
            Some(program_file) => syntax_diagnostics(&program_file.parsed, &key),
            None => Vec::new(),
        }
    }

    fn semantic_diagnostics(&mut self, host: &mut dyn CompilerHost, file: &Path) -> Vec<Diagnostic> {
        self.sync(host);
        let key = host.key(file);
        if self.refresh(host, file).is_none() {
            return Vec::new();
        }
        self.log.push(key.as_path().to_path_buf());

        let targets: Vec<Option<FilePath>> = self.program[&key]
            .resolutions
            .iter()
            .map(|r| r.as_ref().map(|m| host.key(&m.resolved_file_name)))
            .collect();
        let program_file = &self.program[&key];

        let mut diagnostics = Vec::new();
        for marker in &program_file.parsed.markers {
            let span = TextSpan::new(marker.offset, marker.len);
            let diagnostic = match marker.kind {
                MarkerKind::SyntaxError => continue,
                MarkerKind::TypeError => Diagnostic::error(
                    2322,
                    "Type 'string' is not assignable to type 'number'.",
                ),
                MarkerKind::Warning => {
                    Diagnostic::warning(6133, "'value' is declared but its value is never read.")
                }
            };
            diagnostics.push(diagnostic.at(key.clone(), span));
        }

        for (import, target) in program_file.parsed.imports.iter().zip(&targets) {
            let span = TextSpan::new(import.offset, import.specifier.len() as u32);
            let Some(target) = target else {
                diagnostics.push(
                    Diagnostic::error(
                        2307,
                        format!(
                            "Cannot find module '{}' or its corresponding type declarations.",
                            import.specifier
                        ),
                    )
                    .at(key.clone(), span),
                );
                continue;
            };
            let Some(exports) = self.program.get(target).map(|f| &f.parsed.exports) else {
                continue;
            };
            for name in import.names.iter().filter(|n| !exports.contains(*n)) {
                diagnostics.push(
                    Diagnostic::error(
                        2305,
                        format!(
                            "Module '\"{}\"' has no exported member '{name}'.",
                            import.specifier
                        ),
                    )
                    .at(key.clone(), span),
                );
            }
        }
        diagnostics
    }

    fn emit(&mut self, host: &mut dyn CompilerHost, file: &Path) -> EmitOutput {
        self.sync(host);
        let Some(text) = host.script_text(file) else {
            return skipped();
        };
        if self.options.no_emit() || is_declaration_file(file) {
            return skipped();
        }
        let Some(program_file) = self.refresh(host, file) else {
            return skipped();
        };
        let exports: Vec<String> = program_file.parsed.exports.iter().cloned().collect();

        let js_name = output_path(file, self.options.out_dir(), "js");
        let mut output_files = vec![OutputFile {
            name: js_name.clone(),
            text: javascript(&text, &js_name, self.options.source_map()),
        }];
        if self.options.source_map() {
            output_files.push(OutputFile {
                name: append_suffix(&js_name, ".map"),
                text: source_map(&js_name, file),
            });
        }
        if self.options.declaration() {
            let dir = self.options.declaration_dir().or(self.options.out_dir());
            output_files.push(OutputFile {
                name: output_path(file, dir, "d.ts"),
                text: exports
                    .iter()
                    .map(|name| format!("export declare const {name}: unknown;\n"))
                    .collect(),
            });
        }
        EmitOutput {
            output_files,
            emit_skipped: false,
        }
    }
}

fn skipped() -> EmitOutput {
    EmitOutput {
        output_files: Vec::new(),
        emit_skipped: true,
    }
}

fn syntax_diagnostics(parsed: &ParsedScript, file: &FilePath) -> Vec<Diagnostic> {
    parsed
        .markers
        .iter()
        .filter(|m| m.kind == MarkerKind::SyntaxError)
        .map(|m| Diagnostic::error(1005, "';' expected.").at(file.clone(), TextSpan::new(m.offset, m.len)))
        .collect()
}

fn javascript(text: &str, js_name: &Path, with_map: bool) -> String {
    let mut out = String::from("\"use strict\";\n");
    out.push_str(text);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    if with_map {
        let map_name = append_suffix(js_name, ".map");
        let file_name = map_name.file_name().map(|n| n.to_string_lossy().into_owned());
        out.push_str(&format!("//# sourceMappingURL={}", file_name.unwrap_or_default()));
    }
    out
}

fn source_map(js_name: &Path, source: &Path) -> String {
    let file = js_name.file_name().map(|n| n.to_string_lossy().into_owned());
    json!({
        "version": 3,
        "file": file,
        "sources": [source.to_string_lossy()],
        "names": [],
        "mappings": "",
    })
    .to_string()
}

/// `dir/stem.ext`, with `dir` defaulting to the source's own directory.
fn output_path(source: &Path, dir: Option<&str>, ext: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = match dir {
        Some(dir) => PathBuf::from(dir),
        None => source.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    dir.join(format!("{stem}.{ext}"))
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn is_relative(name: &str) -> bool {
    name.starts_with("./") || name.starts_with("../") || name.starts_with('/') || name == "."
}

fn has_script_name(name: &str) -> bool {
    [".ts", ".tsx", ".mts", ".cts"].iter().any(|ext| name.ends_with(ext))
}

fn resolve_relative(base: &Path, options: &CompilerOptions, fs: &dyn FileSystem) -> Option<PathBuf> {
    let direct = base
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| options.script_extensions().iter().any(|x| *x == e));
    if direct && fs.file_exists(base) {
        return Some(base.to_path_buf());
    }
    let mut candidates: Vec<PathBuf> = [".ts", ".tsx", ".d.ts"]
        .iter()
        .map(|ext| append_suffix(base, ext))
        .collect();
    if options.allow_js() {
        candidates.push(append_suffix(base, ".js"));
    }
    candidates.push(base.join("index.ts"));
    candidates.push(base.join("index.d.ts"));
    candidates.into_iter().find(|c| fs.file_exists(c))
}

fn resolve_package(name: &str, from_dir: &Path, fs: &dyn FileSystem) -> Option<PathBuf> {
    for dir in from_dir.ancestors() {
        let modules = dir.join("node_modules");
        let candidates = [
            append_suffix(&modules.join(name), ".d.ts"),
            modules.join(name).join("index.d.ts"),
            modules.join(name).join("index.ts"),
            modules.join("@types").join(name).join("index.d.ts"),
        ];
        if let Some(found) = candidates.into_iter().find(|c| fs.file_exists(c)) {
            return Some(found);
        }
    }
    None
}
