//! How diagnostics reach the host: filtering, formatting, tagging, routing.

use serde_json::json;
use std::sync::Arc;
use tsl_conformance::{FsResolver, Harness, RecordingHost, ROOT};
use tsl_diagnostics::{ErrorInfo, HostError, Severity};

const APP: &str = "/project/src/app.ts";
const LEGACY: &str = "/project/src/legacy/old.ts";

// ============================================================================
// Formatting and location
// ============================================================================

#[test]
fn default_format_is_context_relative() {
    let mut h = Harness::new(&[(APP, "let a = 1;\nlet n = 1; // @type-error\n")]);
    h.process(APP).expect("app should emit");
    h.round();

    let errors = h.host.errors_for(APP);
    assert_eq!(errors.len(), 1);
    let error = &errors[0];
    assert_eq!(
        error.message,
        "ERROR in src/app.ts(2,15): TS2322: Type 'string' is not assignable to type 'number'."
    );
    assert_eq!(error.severity, Severity::Error);
    let location = error.location.expect("located error");
    assert_eq!((location.line, location.character), (2, 15));
    assert_eq!((location.end_line, location.end_character), (2, 26));
}

#[test]
fn custom_formatter_is_used() {
    let mut h = Harness::new(&[(APP, "let n = 1; // @type-error\n")]);
    let formatter = |info: &ErrorInfo<'_>| format!("[{}] {}", info.code, info.message);
    let resolver = Arc::new(FsResolver::new(h.fs.clone()));
    h.host = RecordingHost::new(h.identity(), ROOT, resolver).with_formatter(Arc::new(formatter));
    h.process(APP).expect("app should emit");
    h.round();
    assert_eq!(
        h.host.errors_for(APP)[0].message,
        "[TS2322] Type 'string' is not assignable to type 'number'."
    );
}

#[test]
fn warnings_are_reported_with_their_severity() {
    let mut h = Harness::new(&[(APP, "let unused = 1; // @warn\n")]);
    h.process(APP).expect("app should emit");
    let report = h.round();
    assert_eq!((report.errors, report.warnings), (0, 1));
    let error = &h.host.errors_for(APP)[0];
    assert_eq!(error.severity, Severity::Warning);
    assert!(error.message.starts_with("WARNING in src/app.ts(1,20): TS6133"));
}

// ============================================================================
// Filtering
// ============================================================================

#[test]
fn ignored_codes_are_dropped() {
    let mut h = Harness::with_options(
        &[(APP, "let n = 1; // @type-error\nlet m = 1; // @warn\n")],
        json!({ "ignoreDiagnostics": [2322] }),
    );
    h.process(APP).expect("app should emit");
    let report = h.round();
    assert_eq!(report.errors, 0);
    assert_eq!(h.host.codes_for(APP), vec![6133]);
}

#[test]
fn report_files_limits_reported_files() {
    let mut h = Harness::with_options(
        &[
            (APP, "let n = 1; // @type-error\n"),
            (LEGACY, "let n = 1; // @type-error\n"),
        ],
        json!({ "reportFiles": ["src/**/*.ts", "!src/legacy/**"] }),
    );
    h.process_all(&[APP, LEGACY]);
    let report = h.round();
    assert_eq!(report.errors, 1);
    assert_eq!(h.host.codes_for(APP), vec![2322]);
    assert!(h.host.errors_for(LEGACY).is_empty());
}

#[test]
fn invalid_report_files_glob_is_fatal() {
    let mut h = Harness::with_options(
        &[(APP, "export const a = 1;\n")],
        json!({ "reportFiles": ["src/[unclosed"] }),
    );
    assert!(h.process(APP).is_err());
}

// ============================================================================
// Tagging and routing
// ============================================================================

#[test]
fn foreign_errors_survive_rounds() {
    let mut h = Harness::new(&[(APP, "let n = 1; // @type-error\n")]);
    h.process(APP).expect("app should emit");
    let foreign = HostError::message(Severity::Warning, "lint: prefer const").with_origin("eslint");
    h.host
        .modules
        .get_mut(std::path::Path::new(APP))
        .expect("module record")
        .push(foreign.clone());

    h.round();
    h.rebuild(&[(APP, "const n = 1;\n")]);
    assert_eq!(h.host.errors_for(APP), &[foreign]);
}

#[test]
fn errors_for_files_without_a_module_go_to_the_build_list() {
    let mut h = Harness::new(&[
        (APP, "import { value } from \"./lib\";\nexport const a = value;\n"),
        ("/project/src/lib.ts", "export const value = 1; // @type-error\n"),
    ]);
    h.process(APP).expect("app should emit");
    h.round();

    assert!(h.host.errors_for(APP).is_empty());
    assert_eq!(h.host.build_errors.len(), 1);
    assert_eq!(
        h.host.build_errors[0].file.as_deref(),
        Some(std::path::Path::new("/project/src/lib.ts"))
    );

    h.rebuild(&[("/project/src/lib.ts", "export const value = 1;\n")]);
    assert!(h.host.build_errors.is_empty());
}

#[test]
fn option_diagnostics_are_reported_once() {
    let mut h = Harness::with_options(
        &[(APP, "export const a = 1;\n")],
        json!({ "compilerOptions": { "target": "es3" } }),
    );
    h.process(APP).expect("app should emit");
    h.round();
    h.rebuild(&[(APP, "export const a = 2;\n")]);
    h.round();

    let option_errors: Vec<&HostError> = h
        .host
        .build_errors
        .iter()
        .filter(|e| e.code.map(|c| c.number()) == Some(5107))
        .collect();
    assert_eq!(option_errors.len(), 1);
    assert_eq!(option_errors[0].origin.as_deref(), Some("tsl-default_0"));
    assert!(option_errors[0].file.is_none());
}

#[test]
fn engine_errors_become_a_single_host_error() {
    let mut h = Harness::new(&[("/project/node_modules/pkg/index.ts", "export const a = 1;\n")]);
    let err = h.process("/project/node_modules/pkg/index.ts").unwrap_err();
    let host_error = err.to_host_error();
    assert_eq!(host_error.severity, Severity::Error);
    assert!(host_error.message.contains("allowTsInNodeModules"));
    assert!(host_error.origin.is_none());
}
