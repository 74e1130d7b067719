//! Known-vulnerability lookup against the OSV.dev index.
//!
//! Only pinned dependencies are queried; a range cannot be matched to an
//! advisory without resolving it. Network failure is silent: a missing
//! advisory lookup is not a fact about the project.

use std::time::Duration;

use futures::{stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::audit::dependencies::DependencyAuditor;
use crate::audit::types::{AuditKind, Finding, Severity};
use crate::audit::Auditor;
use crate::config::AuditConfig;
use crate::extract::{ConstraintKind, Dependency};

const OSV_URL: &str = "https://api.osv.dev/v1/query";
const OSV_TIMEOUT: Duration = Duration::from_secs(10);
const CONCURRENT_QUERIES: usize = 8;

#[derive(Serialize)]
struct OsvQuery<'a> {
    version: &'a str,
    package: OsvPackage<'a>,
}

#[derive(Serialize)]
struct OsvPackage<'a> {
    name: &'a str,
    ecosystem: &'a str,
}

#[derive(Deserialize, Default)]
struct OsvResponse {
    #[serde(default)]
    vulns: Vec<OsvVuln>,
}

#[derive(Deserialize)]
struct OsvVuln {
    id: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    severity: Vec<OsvSeverity>,
}

#[derive(Deserialize)]
struct OsvSeverity {
    #[serde(default, rename = "type")]
    kind: String,
}

impl OsvVuln {
    /// Advisories carrying a CVSS v3 vector are treated as actionable errors;
    /// anything the index cannot score stays a warning.
    fn finding_severity(&self) -> Severity {
        if self.severity.iter().any(|s| s.kind == "CVSS_V3") {
            Severity::Error
        } else {
            Severity::Warning
        }
    }
}

pub struct VulnerabilityAuditor<'a> {
    config: &'a AuditConfig,
}

impl<'a> VulnerabilityAuditor<'a> {
    pub fn new(config: &'a AuditConfig) -> Self {
        Self { config }
    }
}

impl Auditor for VulnerabilityAuditor<'_> {
    fn kind(&self) -> AuditKind {
        AuditKind::Vulnerabilities
    }

    fn run(&self) -> Vec<Finding> {
        let mut findings = Vec::new();
        let manifests =
            DependencyAuditor::new(self.config).collect_manifests(&mut findings);
        // Discovery findings belong to the dependencies auditor; here only
        // advisory hits are reported.
        findings.clear();

        let pinned: Vec<&Dependency> = manifests
            .iter()
            .flat_map(|m| &m.dependencies)
            .filter(|d| d.constraint_kind() == ConstraintKind::Pinned)
            .collect();
        if pinned.is_empty() {
            return findings;
        }

        let Ok(runtime) = tokio::runtime::Runtime::new() else {
            return findings;
        };
        findings.extend(runtime.block_on(query_all(&pinned)));
        findings
    }
}

fn ecosystem_for(dep: &Dependency) -> &'static str {
    if dep.file.ends_with("package.json") {
        "npm"
    } else {
        "PyPI"
    }
}

fn pinned_version(dep: &Dependency) -> &str {
    dep.constraint.trim_start_matches("==").trim()
}

async fn query_all(pinned: &[&Dependency]) -> Vec<Finding> {
    let Ok(client) = reqwest::Client::builder().timeout(OSV_TIMEOUT).build() else {
        return Vec::new();
    };

    stream::iter(pinned.iter().map(|dep| {
        let client = client.clone();
        async move { query_one(&client, dep).await }
    }))
    .buffer_unordered(CONCURRENT_QUERIES)
    .filter_map(|f| async move { f })
    .collect()
    .await
}

async fn query_one(client: &reqwest::Client, dep: &Dependency) -> Option<Finding> {
    let query = OsvQuery {
        version: pinned_version(dep),
        package: OsvPackage {
            name: &dep.name,
            ecosystem: ecosystem_for(dep),
        },
    };

    let resp = client.post(OSV_URL).json(&query).send().await.ok()?;
    if !resp.status().is_success() {
        return None;
    }
    let body: OsvResponse = resp.json().await.ok()?;
    if body.vulns.is_empty() {
        return None;
    }

    let ids: Vec<&str> = body.vulns.iter().map(|v| v.id.as_str()).collect();
    let summary = body
        .vulns
        .iter()
        .find(|v| !v.summary.is_empty())
        .map(|v| v.summary.as_str())
        .unwrap_or("see advisory");
    let severity = body
        .vulns
        .iter()
        .map(OsvVuln::finding_severity)
        .min()
        .unwrap_or(Severity::Warning);
    Some(Finding::new(
        AuditKind::Vulnerabilities,
        severity,
        dep.file.clone(),
        dep.line,
        format!(
            "Known vulnerability in {}=={}: {} ({})",
            dep.name,
            pinned_version(dep),
            ids.join(", "),
            summary
        ),
        format!("Upgrade '{}' past the advisory range", dep.name),
    ))
}
