//! Auditors and the runner that sequences them.
//!
//! Every auditor is constructed with a borrowed `AuditConfig`, scans what it
//! needs, and returns findings. Auditors never fail the invocation: unreadable
//! or malformed inputs degrade to info findings. The runner executes built-in
//! auditors in a fixed order, then plugin units alphabetically, then filters
//! and sorts the combined findings.

pub mod coverage;
pub mod dependencies;
pub mod endpoints;
pub mod plugins;
pub mod quality;
pub mod reconcile;
pub mod types;
pub mod vulnerabilities;

use std::path::Path;

pub use types::{sort_findings, AuditKind, Finding, Severity};

use crate::config::AuditConfig;

/// One audit pass over the project.
pub trait Auditor {
    fn kind(&self) -> AuditKind;
    fn run(&self) -> Vec<Finding>;
}

/// Everything the reporting layer needs from a run.
#[derive(Debug, Clone)]
pub struct AuditOutcome {
    /// Filtered by the severity threshold and sorted by file, line, message.
    pub findings: Vec<Finding>,
    /// Names of the auditors that executed, in execution order.
    pub auditors_run: Vec<String>,
}

impl AuditOutcome {
    pub fn count(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }

    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Error)
    }
}

/// Read a source file for an auditor. An unreadable file is reported as an
/// info finding, never an abort.
pub(crate) fn read_source(
    path: &Path,
    rel: &str,
    kind: AuditKind,
    findings: &mut Vec<Finding>,
) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) => {
            findings.push(Finding::new(
                kind,
                Severity::Info,
                rel,
                0,
                format!("Skipped unreadable file: {}", e),
                "",
            ));
            None
        }
    }
}

fn debug_enabled() -> bool {
    std::env::var_os("STACKAUDIT_DEBUG").is_some()
}

/// Run every selected auditor, then plugin units, in deterministic order.
pub fn run_audits(config: &AuditConfig) -> AuditOutcome {
    let mut findings = Vec::new();
    let mut auditors_run = Vec::new();

    let auditors: Vec<Box<dyn Auditor + '_>> = vec![
        Box::new(reconcile::ReconcileAuditor::new(config)),
        Box::new(endpoints::EndpointAuditor::new(config)),
        Box::new(coverage::CoverageAuditor::new(config)),
        Box::new(dependencies::DependencyAuditor::new(config)),
        Box::new(vulnerabilities::VulnerabilityAuditor::new(config)),
        Box::new(quality::QualityAuditor::new(config)),
    ];

    for auditor in auditors {
        if !config.should_run(auditor.kind()) {
            continue;
        }
        auditors_run.push(auditor.kind().to_string());
        let before = findings.len();
        findings.extend(auditor.run());
        if debug_enabled() {
            eprintln!(
                "[stackaudit] {}: {} finding(s)",
                auditor.kind(),
                findings.len() - before
            );
        }
    }

    let (plugin_findings, plugin_names) = plugins::run_plugins(config);
    findings.extend(plugin_findings);
    auditors_run.extend(plugin_names);

    findings.retain(|f| f.severity.at_least(config.min_severity));
    sort_findings(&mut findings);

    AuditOutcome {
        findings,
        auditors_run,
    }
}
