//! Source-hygiene checks: work markers, hardcoded credentials, and leftover
//! debug output.
//!
//! The `--fix` pass blanks debug-statement lines in place. It is the only
//! mutation any auditor performs on the project under audit.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::audit::types::{AuditKind, Finding, Severity};
use crate::audit::{read_source, Auditor};
use crate::config::AuditConfig;
use crate::extract::files;

static TODO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(TODO|FIXME)\b").unwrap());

static HACK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(HACK|XXX)\b").unwrap());

static CREDENTIAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\b(password|passwd|secret|api_key|apikey|auth_token|access_token|private_key)\b\s*[:=]\s*['"][^'"]{8,}['"]"#,
    )
    .unwrap()
});

static PY_DEBUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:print\s*\(|breakpoint\s*\(\))").unwrap());

static TS_DEBUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:console\.(?:log|debug|trace)\s*\(|debugger\b)").unwrap());

/// Env-var-shaped values are placeholders, not leaks.
static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\$\{|os\.environ|process\.env|getenv|example|changeme|xxxx")
        .unwrap());

fn is_test_file(rel: &str) -> bool {
    let name = rel.rsplit('/').next().unwrap_or(rel);
    name.starts_with("test_")
        || name.ends_with("_test.py")
        || name == "tests.py"
        || name.contains(".test.")
        || name.contains(".spec.")
}

pub struct QualityAuditor<'a> {
    config: &'a AuditConfig,
}

impl<'a> QualityAuditor<'a> {
    pub fn new(config: &'a AuditConfig) -> Self {
        Self { config }
    }

    fn check_file(&self, path: &Path, rel: &str, findings: &mut Vec<Finding>) {
        let Some(text) = read_source(path, rel, AuditKind::Quality, findings) else {
            return;
        };
        let in_tests = is_test_file(rel);
        let debug_re: &Regex = if rel.ends_with(".py") {
            &*PY_DEBUG_RE
        } else {
            &*TS_DEBUG_RE
        };

        let mut fixed_lines: Vec<String> = Vec::new();
        let mut fixed_any = false;

        for (idx, line) in text.lines().enumerate() {
            let lineno = idx + 1;

            if let Some(m) = TODO_RE.find(line) {
                findings.push(Finding::new(
                    AuditKind::Quality,
                    Severity::Warning,
                    rel,
                    lineno,
                    format!("Work marker {}: {}", m.as_str(), line.trim()),
                    "Resolve the marker or file it as a tracked task",
                ));
            } else if let Some(m) = HACK_RE.find(line) {
                findings.push(Finding::new(
                    AuditKind::Quality,
                    Severity::Info,
                    rel,
                    lineno,
                    format!("Work marker {}: {}", m.as_str(), line.trim()),
                    "Revisit the workaround",
                ));
            }

            if CREDENTIAL_RE.is_match(line) && !PLACEHOLDER_RE.is_match(line) {
                findings.push(Finding::new(
                    AuditKind::Quality,
                    Severity::Error,
                    rel,
                    lineno,
                    "Possible hardcoded credential",
                    "Move the value to environment configuration and rotate it",
                ));
            }

            if !in_tests && debug_re.is_match(line) {
                findings.push(Finding::new(
                    AuditKind::Quality,
                    Severity::Warning,
                    rel,
                    lineno,
                    format!("Debug statement: {}", line.trim()),
                    if self.config.fix {
                        "Removed by --fix"
                    } else {
                        "Remove before shipping, or rerun with --fix"
                    },
                ));
                if self.config.fix {
                    fixed_lines.push(String::new());
                    fixed_any = true;
                    continue;
                }
            }
            fixed_lines.push(line.to_string());
        }

        if fixed_any {
            let mut rewritten = fixed_lines.join("\n");
            if text.ends_with('\n') {
                rewritten.push('\n');
            }
            if let Err(e) = std::fs::write(path, rewritten) {
                findings.push(Finding::new(
                    AuditKind::Quality,
                    Severity::Info,
                    rel,
                    0,
                    format!("Could not apply --fix: {}", e),
                    "",
                ));
            }
        }
    }
}

impl Auditor for QualityAuditor<'_> {
    fn kind(&self) -> AuditKind {
        AuditKind::Quality
    }

    fn run(&self) -> Vec<Finding> {
        let mut findings = Vec::new();
        let root = &self.config.project_path;
        for path in files::find_files(
            root,
            &["**/*.py", "**/*.ts", "**/*.tsx", "**/*.js"],
        ) {
            let rel = files::rel_display(root, &path);
            self.check_file(&path, &rel, &mut findings);
        }
        findings
    }
}
