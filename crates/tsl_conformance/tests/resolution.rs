//! Module resolution through the host and the compiler, and the graph edges
//! it produces.

use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError};
use tsl_compiler::{CompilerOptions, ResolvedModule};
use tsl_config::{LoaderOptions, SuffixRules};
use tsl_conformance::{FsResolver, Harness, RecordingHost, ScriptCompiler, ROOT};
use tsl_engine::{EngineError, ModuleResolver};
use tsl_source::MemoryFileSystem;

const APP: &str = "/project/src/app.ts";
const LIB: &str = "/project/src/lib.ts";

fn edges_of(h: &Harness, path: &str) -> Vec<(PathBuf, PathBuf, bool)> {
    let instance = h.instance();
    let instance = instance.lock().unwrap_or_else(PoisonError::into_inner);
    let file = instance.files().key(path);
    instance
        .graph()
        .dependencies_of(&file)
        .iter()
        .map(|d| {
            (
                d.resolved.as_path().to_path_buf(),
                d.original.clone(),
                d.is_external_library_import,
            )
        })
        .collect()
}

// ============================================================================
// Unresolvable imports
// ============================================================================

#[test]
fn unresolved_name_yields_none_beside_resolved_ones() {
    let fs = Arc::new(MemoryFileSystem::with_files([
        (APP, ""),
        (LIB, "export const value = 1;\n"),
    ]));
    let resolver = ModuleResolver::new(
        Arc::new(ScriptCompiler::new()),
        Arc::new(FsResolver::new(fs.clone())),
        SuffixRules::compile(&LoaderOptions::default()).expect("no rules"),
    );
    let names = vec!["missing-pkg".to_string(), "./lib".to_string()];
    let resolved = resolver.resolve_module_names(
        &names,
        Path::new(APP),
        &CompilerOptions::default(),
        fs.as_ref(),
    );
    assert_eq!(resolved, vec![None, Some(ResolvedModule::new(LIB, false))]);
}

#[test]
fn missing_package_gets_no_edge_and_a_diagnostic() {
    let mut h = Harness::new(&[
        (
            APP,
            "import { x } from \"missing-pkg\";\nimport { value } from \"./lib\";\nexport const a = value;\n",
        ),
        (LIB, "export const value = 1;\n"),
    ]);
    let output = h.process(APP).expect("unresolved imports do not stop emit");
    assert_eq!(output.dependencies, vec![PathBuf::from(LIB)]);
    assert_eq!(
        edges_of(&h, APP),
        vec![(PathBuf::from(LIB), PathBuf::from(LIB), false)]
    );

    let report = h.round();
    assert_eq!(report.errors, 1);
    assert_eq!(h.host.codes_for(APP), vec![2307]);
    let error = &h.host.errors_for(APP)[0];
    assert!(error.message.contains("Cannot find module 'missing-pkg'"));
    let location = error.location.expect("located error");
    assert_eq!((location.line, location.character), (1, 20));
}

#[test]
fn installing_the_package_clears_the_diagnostic() {
    let mut h = Harness::new(&[(APP, "import { x } from \"missing-pkg\";\nexport const a = x;\n")]);
    h.process(APP).expect("app should emit");
    h.round();
    assert_eq!(h.host.codes_for(APP), vec![2307]);

    h.fs.write(
        "/project/node_modules/missing-pkg/index.d.ts",
        "export const x: number;\n",
    );
    let report = h.rebuild(&[(APP, "import { x } from \"missing-pkg\";\nexport const a = x + 1;\n")]);
    assert_eq!(report.errors, 0);
    assert!(h.host.errors_for(APP).is_empty());
    assert_eq!(
        edges_of(&h, APP),
        vec![(
            PathBuf::from("/project/node_modules/missing-pkg/index.d.ts"),
            PathBuf::from("/project/node_modules/missing-pkg/index.d.ts"),
            true
        )]
    );
}

// ============================================================================
// Reconciling host and compiler answers
// ============================================================================

#[test]
fn typings_win_over_javascript_implementation() {
    let mut h = Harness::with_options(
        &[
            (APP, "import { run } from \"pkg\";\nexport const a = run;\n"),
            ("/project/node_modules/pkg/index.js", "exports.run = 1;\n"),
            ("/project/node_modules/pkg/index.d.ts", "export function run(): void;\n"),
        ],
        json!({ "compilerOptions": { "allowJs": true } }),
    );
    h.process(APP).expect("app should emit");
    assert_eq!(
        edges_of(&h, APP),
        vec![(
            PathBuf::from("/project/node_modules/pkg/index.d.ts"),
            PathBuf::from("/project/node_modules/pkg/index.d.ts"),
            true
        )]
    );
    h.round();
    assert!(h.host.errors_for(APP).is_empty());
}

#[test]
fn host_aliases_are_honored() {
    let mut h = Harness::new(&[
        (APP, "import { value } from \"@lib\";\nexport const a = value;\n"),
        (LIB, "export const value = 1;\n"),
    ]);
    let resolver = FsResolver::new(h.fs.clone()).with_alias("@lib", LIB);
    h.host = RecordingHost::new(h.identity(), ROOT, Arc::new(resolver));

    let output = h.process(APP).expect("app should emit");
    assert_eq!(output.dependencies, vec![PathBuf::from(LIB)]);
    h.round();
    assert!(h.host.errors_for(APP).is_empty());
}

#[test]
fn declaration_files_are_declared_dependencies() {
    let mut h = Harness::new(&[
        (APP, "import { value } from \"./lib\";\nimport { env } from \"./env\";\n"),
        (LIB, "export const value = 1;\n"),
        ("/project/src/env.d.ts", "export const env: string;\n"),
    ]);
    let output = h.process(APP).expect("app should emit");
    assert_eq!(
        output.dependencies,
        vec![PathBuf::from("/project/src/env.d.ts"), PathBuf::from(LIB)]
    );
    assert_eq!(output.definition_file_versions.len(), 2);
}

// ============================================================================
// Suffix rules
// ============================================================================

#[test]
fn suffix_rules_map_bundled_files_to_analyzed_names() {
    let mut h = Harness::with_options(
        &[
            (APP, "import { component } from \"./App.vue\";\nexport const a = component;\n"),
            ("/project/src/App.vue", "export const component = 1;\n"),
        ],
        json!({ "appendTsSuffixTo": ["\\.vue$"] }),
    );
    let vue = h.process("/project/src/App.vue").expect("vue file should emit");
    assert!(vue.text.contains("export const component = 1;"));
    let output = h.process(APP).expect("app should emit");
    assert_eq!(output.dependencies, vec![PathBuf::from("/project/src/App.vue")]);
    assert_eq!(
        edges_of(&h, APP),
        vec![(
            PathBuf::from("/project/src/App.vue.ts"),
            PathBuf::from("/project/src/App.vue"),
            false
        )]
    );

    let report = h.round();
    assert_eq!(report.errors, 0);
    assert!(report
        .rechecked
        .contains(&PathBuf::from("/project/src/App.vue.ts")));
}

#[test]
fn invalid_suffix_pattern_is_fatal() {
    let mut h = Harness::with_options(
        &[(APP, "export const a = 1;\n")],
        json!({ "appendTsxSuffixTo": ["(unclosed"] }),
    );
    let err = h.process(APP).unwrap_err();
    assert!(matches!(err, EngineError::Config(_)));
}
