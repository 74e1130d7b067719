//! Integration tests for the full audit pipeline over the fixture trees.
//!
//! `testdata/drifted` is a two-language monorepo seeded with one instance of
//! each drift class; `testdata/clean` is the same shape with nothing wrong.
//! The vulnerability auditor is excluded here because it talks to the
//! network.

use std::path::PathBuf;

use stackaudit::audit::{run_audits, AuditOutcome};
use stackaudit::{AuditConfig, Severity};

fn testdata(fixture: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("testdata")
        .join(fixture)
}

fn offline_kinds() -> Vec<String> {
    ["types", "endpoints", "tests", "dependencies", "quality"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn audit(fixture: &str) -> AuditOutcome {
    let config = AuditConfig::build(
        &testdata(fixture),
        &offline_kinds(),
        None,
        false,
        None,
        false,
        false,
    )
    .expect("fixture config should validate");
    run_audits(&config)
}

fn has(outcome: &AuditOutcome, severity: Severity, needle: &str) -> bool {
    outcome
        .findings
        .iter()
        .any(|f| f.severity == severity && f.message.contains(needle))
}

#[test]
fn test_clean_fixture_has_no_findings() {
    let outcome = audit("clean");
    assert!(
        outcome.findings.is_empty(),
        "expected clean fixture to be clean, got: {:#?}",
        outcome.findings
    );
}

#[test]
fn test_missing_field_is_reported() {
    let outcome = audit("drifted");
    assert!(has(&outcome, Severity::Error, "Field 'email'"));
}

#[test]
fn test_type_mismatch_is_reported() {
    let outcome = audit("drifted");
    assert!(has(&outcome, Severity::Error, "'UserOut.age' is 'int'"));
}

#[test]
fn test_optionality_mismatch_is_warning() {
    let outcome = audit("drifted");
    assert!(has(&outcome, Severity::Warning, "'UserOut.bio' is optional"));
}

#[test]
fn test_constraint_gap_is_warning() {
    let outcome = audit("drifted");
    assert!(has(&outcome, Severity::Warning, "'SignupIn.password' has min_length=8"));
}

#[test]
fn test_matching_constraint_not_flagged() {
    let outcome = audit("drifted");
    assert!(!outcome
        .findings
        .iter()
        .any(|f| f.message.contains("'SignupIn.username'")));
}

#[test]
fn test_duplicate_route_names_both_files() {
    let outcome = audit("drifted");
    let dup = outcome
        .findings
        .iter()
        .find(|f| f.message.contains("Duplicate route GET /api/users"))
        .expect("duplicate route finding");
    assert_eq!(dup.severity, Severity::Error);
    assert!(dup.message.contains("backend/api.py"));
    assert!(dup.message.contains("frontend/app/api/users/route.ts"));
}

#[test]
fn test_unauthenticated_mutation_is_error() {
    let outcome = audit("drifted");
    assert!(has(
        &outcome,
        Severity::Error,
        "Mutating route without authentication: DELETE /api/users/{pk}"
    ));
}

#[test]
fn test_stub_handler_is_warning() {
    let outcome = audit("drifted");
    assert!(has(&outcome, Severity::Warning, "Stub handler: GET /api/health"));
}

#[test]
fn test_coverage_gap_is_warning() {
    let outcome = audit("drifted");
    assert!(has(&outcome, Severity::Warning, "Feature area 'auth' has no tests"));
}

#[test]
fn test_unpinned_dependency_is_warning() {
    let outcome = audit("drifted");
    assert!(has(&outcome, Severity::Warning, "'requests' has no version constraint"));
}

#[test]
fn test_cross_manifest_conflict_is_error() {
    let outcome = audit("drifted");
    assert!(has(&outcome, Severity::Error, "Version conflict for 'zod'"));
}

#[test]
fn test_deprecated_dependency_is_warning() {
    let outcome = audit("drifted");
    assert!(has(&outcome, Severity::Warning, "'moment' is deprecated"));
}

#[test]
fn test_debug_statement_is_warning() {
    let outcome = audit("drifted");
    let debug = outcome
        .findings
        .iter()
        .find(|f| f.message.contains("Debug statement"))
        .expect("debug finding");
    assert_eq!(debug.file, "backend/api.py");
}

#[test]
fn test_findings_are_deterministic_and_sorted() {
    let a = audit("drifted");
    let b = audit("drifted");
    assert_eq!(a.findings, b.findings);

    let keys: Vec<_> = a
        .findings
        .iter()
        .map(|f| (f.file.clone(), f.line, f.message.clone()))
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

#[test]
fn test_findings_survive_json_round_trip() {
    let outcome = audit("drifted");
    let json = stackaudit::report::render_findings(&outcome.findings).unwrap();
    let parsed = stackaudit::report::parse_findings(&json).unwrap();
    assert_eq!(parsed, outcome.findings);
}

#[test]
fn test_error_threshold_drops_everything_below() {
    let config = AuditConfig::build(
        &testdata("drifted"),
        &offline_kinds(),
        Some("error"),
        false,
        None,
        false,
        false,
    )
    .unwrap();
    let outcome = run_audits(&config);
    assert!(!outcome.findings.is_empty());
    assert!(outcome.findings.iter().all(|f| f.severity == Severity::Error));
}
