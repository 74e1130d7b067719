//! Dependency hygiene across every discovered manifest.
//!
//! Checks are purely declarative: constraint shape, a deprecated-package
//! denylist, cross-manifest version conflicts, and packages declared in both
//! runtime and dev scope. No lockfiles or registries are consulted.

use std::collections::BTreeMap;

use crate::audit::types::{AuditKind, Finding, Severity};
use crate::audit::{read_source, Auditor};
use crate::config::AuditConfig;
use crate::extract::manifests::parse_manifest;
use crate::extract::{files, ConstraintKind, Dependency, Manifest};

pub struct DependencyAuditor<'a> {
    config: &'a AuditConfig,
}

impl<'a> DependencyAuditor<'a> {
    pub fn new(config: &'a AuditConfig) -> Self {
        Self { config }
    }

    /// Every manifest in the project, sorted by path.
    pub fn collect_manifests(&self, findings: &mut Vec<Finding>) -> Vec<Manifest> {
        let root = &self.config.project_path;
        let mut manifests = Vec::new();
        for path in files::manifest_files(root) {
            let rel = files::rel_display(root, &path);
            if let Some(text) = read_source(&path, &rel, AuditKind::Dependencies, findings) {
                manifests.push(parse_manifest(&rel, &text));
            }
        }
        manifests
    }
}

impl Auditor for DependencyAuditor<'_> {
    fn kind(&self) -> AuditKind {
        AuditKind::Dependencies
    }

    fn run(&self) -> Vec<Finding> {
        let mut findings = Vec::new();
        let manifests = self.collect_manifests(&mut findings);

        for manifest in &manifests {
            for dep in &manifest.dependencies {
                check_constraint(dep, &mut findings);
                check_deprecated(dep, &self.config.deprecated, &mut findings);
            }
            check_dual_scope(manifest, &mut findings);
        }

        check_conflicts(&manifests, &mut findings);
        findings
    }
}

fn check_constraint(dep: &Dependency, findings: &mut Vec<Finding>) {
    match dep.constraint_kind() {
        ConstraintKind::None => findings.push(Finding::new(
            AuditKind::Dependencies,
            Severity::Warning,
            dep.file.clone(),
            dep.line,
            format!("Dependency '{}' has no version constraint", dep.name),
            format!("Pin or bound '{}' to a known-good version range", dep.name),
        )),
        ConstraintKind::Unbounded => findings.push(Finding::new(
            AuditKind::Dependencies,
            Severity::Info,
            dep.file.clone(),
            dep.line,
            format!(
                "Dependency '{}' is unbounded above ({})",
                dep.name, dep.constraint
            ),
            format!("Add an upper bound to '{}'", dep.name),
        )),
        ConstraintKind::Pinned | ConstraintKind::Ranged => {}
    }
}

fn check_deprecated(
    dep: &Dependency,
    denylist: &BTreeMap<String, String>,
    findings: &mut Vec<Finding>,
) {
    if let Some(advice) = denylist.get(&dep.name.to_lowercase()) {
        findings.push(Finding::new(
            AuditKind::Dependencies,
            Severity::Warning,
            dep.file.clone(),
            dep.line,
            format!("Dependency '{}' is deprecated", dep.name),
            advice.clone(),
        ));
    }
}

/// Same package in both runtime and dev scope of one manifest.
fn check_dual_scope(manifest: &Manifest, findings: &mut Vec<Finding>) {
    let mut scopes: BTreeMap<&str, (bool, bool, usize)> = BTreeMap::new();
    for dep in &manifest.dependencies {
        let entry = scopes.entry(&dep.name).or_insert((false, false, dep.line));
        if dep.dev {
            entry.1 = true;
        } else {
            entry.0 = true;
        }
    }
    for (name, (runtime, dev, line)) in scopes {
        if runtime && dev {
            findings.push(Finding::new(
                AuditKind::Dependencies,
                Severity::Warning,
                manifest.file.clone(),
                line,
                format!("Dependency '{}' is declared in both runtime and dev scope", name),
                "Keep one declaration; dev scope only if unused at runtime",
            ));
        }
    }
}

/// The same package pinned or bounded differently in two manifests is an
/// error; drifting versions across the stack is exactly the class of bug
/// this tool exists to catch.
fn check_conflicts(manifests: &[Manifest], findings: &mut Vec<Finding>) {
    let mut by_name: BTreeMap<&str, Vec<&Dependency>> = BTreeMap::new();
    for manifest in manifests {
        for dep in &manifest.dependencies {
            by_name.entry(&dep.name).or_default().push(dep);
        }
    }

    for (name, deps) in by_name {
        let mut constraints: Vec<&str> = deps
            .iter()
            .map(|d| d.constraint.as_str())
            .filter(|c| !c.is_empty())
            .collect();
        constraints.sort_unstable();
        constraints.dedup();
        if constraints.len() < 2 {
            continue;
        }
        let locations: Vec<String> = deps
            .iter()
            .map(|d| format!("{}:{} ({})", d.file, d.line, if d.constraint.is_empty() { "any" } else { &d.constraint }))
            .collect();
        let first = deps[0];
        findings.push(Finding::new(
            AuditKind::Dependencies,
            Severity::Error,
            first.file.clone(),
            first.line,
            format!(
                "Version conflict for '{}' across manifests: {}",
                name,
                locations.join(", ")
            ),
            format!("Align every manifest on one constraint for '{}'", name),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn run_on(temp: &TempDir) -> Vec<Finding> {
        let config =
            AuditConfig::build(temp.path(), &[], None, false, None, false, false).unwrap();
        DependencyAuditor::new(&config).run()
    }

    #[test]
    fn test_unpinned_and_unbounded() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("pyproject.toml"),
            "[project]\ndependencies = [\n    \"requests\",\n    \"django>=5.0\",\n    \"pydantic==2.7.1\",\n]\n",
        )
        .unwrap();

        let findings = run_on(&temp);
        let unpinned = findings
            .iter()
            .find(|f| f.message.contains("'requests'"))
            .unwrap();
        assert_eq!(unpinned.severity, Severity::Warning);
        let unbounded = findings
            .iter()
            .find(|f| f.message.contains("'django'"))
            .unwrap();
        assert_eq!(unbounded.severity, Severity::Info);
        assert!(!findings.iter().any(|f| f.message.contains("'pydantic'")));
    }

    #[test]
    fn test_deprecated_denylist() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("package.json"),
            "{\n  \"dependencies\": {\n    \"moment\": \"2.29.0\"\n  }\n}\n",
        )
        .unwrap();

        let findings = run_on(&temp);
        let dep = findings
            .iter()
            .find(|f| f.message.contains("deprecated"))
            .unwrap();
        assert_eq!(dep.severity, Severity::Warning);
        assert!(dep.suggestion.contains("date-fns"));
    }

    #[test]
    fn test_cross_manifest_conflict_is_error() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("backend")).unwrap();
        std::fs::write(
            temp.path().join("pyproject.toml"),
            "[project]\ndependencies = [\n    \"pydantic==2.7.1\",\n]\n",
        )
        .unwrap();
        std::fs::write(
            temp.path().join("backend/pyproject.toml"),
            "[project]\ndependencies = [\n    \"pydantic==2.5.0\",\n]\n",
        )
        .unwrap();

        let findings = run_on(&temp);
        let conflict = findings
            .iter()
            .find(|f| f.message.contains("Version conflict"))
            .unwrap();
        assert_eq!(conflict.severity, Severity::Error);
        assert!(conflict.message.contains("2.7.1"));
        assert!(conflict.message.contains("2.5.0"));
    }

    #[test]
    fn test_dual_scope_is_warning() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("package.json"),
            concat!(
                "{\n",
                "  \"dependencies\": { \"zod\": \"3.23.0\" },\n",
                "  \"devDependencies\": { \"zod\": \"3.23.0\" }\n",
                "}\n",
            ),
        )
        .unwrap();

        let findings = run_on(&temp);
        assert!(findings
            .iter()
            .any(|f| f.message.contains("both runtime and dev scope")));
    }

    #[test]
    fn test_same_constraint_everywhere_is_clean() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("frontend")).unwrap();
        std::fs::write(
            temp.path().join("package.json"),
            "{\n  \"dependencies\": { \"zod\": \"3.23.0\" }\n}\n",
        )
        .unwrap();
        std::fs::write(
            temp.path().join("frontend/package.json"),
            "{\n  \"dependencies\": { \"zod\": \"3.23.0\" }\n}\n",
        )
        .unwrap();

        assert!(run_on(&temp).is_empty());
    }
}
