//! Endpoint reconciliation: duplicates, stubs, unauthenticated mutations,
//! and the optional live probe.

use std::collections::BTreeMap;

use crate::audit::types::{AuditKind, Finding, Severity};
use crate::audit::{read_source, Auditor};
use crate::config::AuditConfig;
use crate::extract::routes::{extract_convention_routes, extract_decorator_routes};
use crate::extract::{files, Route};
use crate::probe;

pub struct EndpointAuditor<'a> {
    config: &'a AuditConfig,
}

impl<'a> EndpointAuditor<'a> {
    pub fn new(config: &'a AuditConfig) -> Self {
        Self { config }
    }

    /// All routes of both dialects, in discovery order (already path-sorted
    /// by the file walker, line-sorted within a file).
    pub fn collect_routes(&self, findings: &mut Vec<Finding>) -> Vec<Route> {
        let root = &self.config.project_path;
        let mut routes = Vec::new();

        for path in files::route_files(root) {
            let rel = files::rel_display(root, &path);
            if let Some(text) = read_source(&path, &rel, AuditKind::Endpoints, findings) {
                routes.extend(extract_decorator_routes(&rel, &text));
            }
        }
        for path in files::convention_route_files(root) {
            let rel = files::rel_display(root, &path);
            if let Some(text) = read_source(&path, &rel, AuditKind::Endpoints, findings) {
                routes.extend(extract_convention_routes(&rel, &text));
            }
        }

        routes
    }
}

impl Auditor for EndpointAuditor<'_> {
    fn kind(&self) -> AuditKind {
        AuditKind::Endpoints
    }

    fn run(&self) -> Vec<Finding> {
        let mut findings = Vec::new();
        let routes = self.collect_routes(&mut findings);

        check_duplicates(&routes, &mut findings);

        for route in &routes {
            if route.is_stub {
                findings.push(Finding::new(
                    AuditKind::Endpoints,
                    Severity::Warning,
                    route.file.clone(),
                    route.line,
                    format!("Stub handler: {} {} ({})", route.method, route.path, route.handler),
                    "Implement the handler body or remove the route",
                ));
            }
            if route.is_mutating() && !route.requires_auth {
                findings.push(Finding::new(
                    AuditKind::Endpoints,
                    Severity::Error,
                    route.file.clone(),
                    route.line,
                    format!(
                        "Mutating route without authentication: {} {}",
                        route.method, route.path
                    ),
                    "Add an auth requirement or mark the route intentionally public",
                ));
            }
        }

        if self.config.live {
            findings.extend(probe::probe_routes(self.config, &routes));
        }

        findings
    }
}

/// Two declarations of the same method and normalized path are an error. The
/// finding names every declaring file so the fix is unambiguous.
fn check_duplicates(routes: &[Route], findings: &mut Vec<Finding>) {
    let mut by_key: BTreeMap<(String, String), Vec<&Route>> = BTreeMap::new();
    for route in routes {
        by_key.entry(route.key()).or_default().push(route);
    }

    for ((method, path), group) in by_key {
        if group.len() < 2 {
            continue;
        }
        let locations: Vec<String> = group
            .iter()
            .map(|r| format!("{}:{}", r.file, r.line))
            .collect();
        let first = group[0];
        findings.push(Finding::new(
            AuditKind::Endpoints,
            Severity::Error,
            first.file.clone(),
            first.line,
            format!(
                "Duplicate route {} {} declared {} times ({})",
                method,
                path,
                group.len(),
                locations.join(", ")
            ),
            "Remove or rename all but one declaration",
        ));
    }
}
