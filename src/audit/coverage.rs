//! Test-coverage reconciliation by feature area.
//!
//! Code facts (schemas and routes) and test cases are classified against the
//! same area vocabulary; an area present in code but absent from tests is a
//! coverage gap. The classifier is heuristic, so gaps are warnings, never
//! errors.

use std::collections::BTreeMap;

use crate::audit::endpoints::EndpointAuditor;
use crate::audit::types::{AuditKind, Finding, Severity};
use crate::audit::{read_source, Auditor};
use crate::config::AuditConfig;
use crate::extract::tests::{classify_areas, parse_test_file};
use crate::extract::{files, BackendClassExtractor, SchemaExtractor};

pub struct CoverageAuditor<'a> {
    config: &'a AuditConfig,
}

impl<'a> CoverageAuditor<'a> {
    pub fn new(config: &'a AuditConfig) -> Self {
        Self { config }
    }

    /// Areas mentioned by code facts, each with the first location that
    /// mentioned it (files arrive sorted, so "first" is stable).
    fn code_areas(&self, findings: &mut Vec<Finding>) -> BTreeMap<String, (String, usize)> {
        let root = &self.config.project_path;
        let mut areas: BTreeMap<String, (String, usize)> = BTreeMap::new();
        let mut note = |area: String, file: &str, line: usize| {
            areas.entry(area).or_insert_with(|| (file.to_string(), line));
        };

        for path in files::schema_files(root) {
            let rel = files::rel_display(root, &path);
            let Some(text) = read_source(&path, &rel, AuditKind::Tests, findings) else {
                continue;
            };
            for schema in BackendClassExtractor.extract(&rel, &text) {
                for area in classify_areas(&schema.name, &self.config.areas) {
                    note(area, &schema.file, schema.line);
                }
            }
        }

        for route in EndpointAuditor::new(self.config).collect_routes(findings) {
            let haystack = format!("{} {}", route.handler, route.path);
            for area in classify_areas(&haystack, &self.config.areas) {
                note(area, &route.file, route.line);
            }
        }

        areas
    }
}

impl Auditor for CoverageAuditor<'_> {
    fn kind(&self) -> AuditKind {
        AuditKind::Tests
    }

    fn run(&self) -> Vec<Finding> {
        let mut findings = Vec::new();
        let root = &self.config.project_path;

        let code_areas = self.code_areas(&mut findings);

        let mut tests_per_area: BTreeMap<String, usize> = BTreeMap::new();
        for path in files::test_files(root) {
            let rel = files::rel_display(root, &path);
            let Some(text) = read_source(&path, &rel, AuditKind::Tests, &mut findings) else {
                continue;
            };
            let suite = parse_test_file(&rel, &text, &self.config.areas);
            if suite.cases.is_empty() {
                findings.push(Finding::new(
                    AuditKind::Tests,
                    Severity::Info,
                    rel,
                    1,
                    "Test file contains no test cases",
                    "Add tests or remove the empty file",
                ));
                continue;
            }
            for case in &suite.cases {
                for area in &case.areas {
                    *tests_per_area.entry(area.clone()).or_insert(0) += 1;
                }
            }
        }

        for (area, (file, line)) in &code_areas {
            match tests_per_area.get(area).copied().unwrap_or(0) {
                0 => findings.push(Finding::new(
                    AuditKind::Tests,
                    Severity::Warning,
                    file.clone(),
                    *line,
                    format!("Feature area '{}' has no tests", area),
                    format!("Add a test exercising the '{}' behavior", area),
                )),
                n if n < self.config.sparse_test_threshold => findings.push(Finding::new(
                    AuditKind::Tests,
                    Severity::Info,
                    file.clone(),
                    *line,
                    format!("Feature area '{}' is sparsely tested ({} test case)", area, n),
                    format!("Suggested test: test_{}_edge_cases", area),
                )),
                _ => {}
            }
        }

        findings
    }
}
