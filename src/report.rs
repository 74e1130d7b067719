//! Output formatting for audit results.
//!
//! Three surfaces:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured report for programmatic consumption; findings survive
//!   a render/parse round trip exactly
//! - Notes: an idempotent block injected between sentinel markers in the
//!   project's task notes file

use std::path::{Path, PathBuf};

use colored::*;
use serde::{Deserialize, Serialize};

use crate::audit::types::{sort_findings, Finding, Severity};
use crate::audit::AuditOutcome;

pub const NOTES_START: &str = "<!-- audit:start -->";
pub const NOTES_END: &str = "<!-- audit:end -->";

// =============================================================================
// JSON Format
// =============================================================================

/// Top-level JSON report document.
#[derive(Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub path: String,
    pub auditors_run: Vec<String>,
    pub summary: JsonSummary,
    pub findings: Vec<Finding>,
}

#[derive(Serialize, Deserialize)]
pub struct JsonSummary {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
}

/// Render findings alone as a JSON array. `parse_findings` inverts this
/// exactly.
pub fn render_findings(findings: &[Finding]) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(findings)?)
}

/// Parse a findings array previously produced by `render_findings`.
pub fn parse_findings(json: &str) -> anyhow::Result<Vec<Finding>> {
    Ok(serde_json::from_str(json)?)
}

/// Write the full report document to stdout.
pub fn write_json(path: &str, outcome: &AuditOutcome) -> anyhow::Result<()> {
    let report = JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: path.to_string(),
        auditors_run: outcome.auditors_run.clone(),
        summary: JsonSummary {
            errors: outcome.count(Severity::Error),
            warnings: outcome.count(Severity::Warning),
            infos: outcome.count(Severity::Info),
        },
        findings: outcome.findings.clone(),
    };

    let json = serde_json::to_string_pretty(&report)?;
    println!("{}", json);
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write results in pretty (human-readable) format.
pub fn write_pretty(path: &str, outcome: &AuditOutcome) {
    println!();
    print!("  ");
    print!("{}", "stackaudit".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    print!("  {}", "Auditing: ".dimmed());
    println!("{}", path);
    print!("  {}", "Auditors: ".dimmed());
    println!("{}", outcome.auditors_run.join(", "));
    println!();

    if outcome.findings.is_empty() {
        println!("  {}", "✓ No findings".green());
        println!();
        return;
    }

    println!("  {} ({}):", "Findings".bold(), outcome.findings.len());
    println!();
    for finding in &outcome.findings {
        write_severity_tag(finding.severity);
        print!("   ");
        print!("{:<15}", finding.kind.as_str().dimmed());
        print!("{}", finding.file.blue());
        if finding.line > 0 {
            print!("{}", format!(":{}", finding.line).dimmed());
        }
        println!();
        println!("            {}", finding.message);
        if !finding.suggestion.is_empty() {
            println!("            {}", format!("fix: {}", finding.suggestion).dimmed());
        }
        println!();
    }

    write_summary_line(outcome);
    println!();
}

fn write_severity_tag(severity: Severity) {
    match severity {
        Severity::Error => print!("    {} ", "ERROR".red()),
        Severity::Warning => print!("    {} ", "WARN ".yellow()),
        Severity::Info => print!("    {} ", "INFO ".blue()),
    }
}

fn write_summary_line(outcome: &AuditOutcome) {
    let errors = outcome.count(Severity::Error);
    let warnings = outcome.count(Severity::Warning);
    let infos = outcome.count(Severity::Info);

    print!("  ");
    if errors > 0 {
        print!("{}", format!("{} error(s)", errors).red());
    } else {
        print!("{}", "0 errors".green());
    }
    print!("  {}", format!("{} warning(s)", warnings).yellow());
    print!("  {}", format!("{} info", infos).dimmed());
    println!();
}

// =============================================================================
// Notes Injection
// =============================================================================

/// Locate the notes file the audit block is maintained in.
fn notes_file(project_path: &Path) -> PathBuf {
    let tasks = project_path.join("tasks").join("todo.md");
    if tasks.is_file() {
        return tasks;
    }
    project_path.join("todo.md")
}

/// The block written between the sentinel markers. Errors and warnings only;
/// info findings are noise at this surface.
fn notes_block(findings: &[Finding]) -> String {
    let mut owned: Vec<Finding> = findings
        .iter()
        .filter(|f| f.severity != Severity::Info)
        .cloned()
        .collect();
    // Re-sorted here so the block is stable for callers that did not sort.
    sort_findings(&mut owned);

    let mut out = String::new();
    out.push_str(NOTES_START);
    out.push('\n');
    out.push_str("## Audit findings\n");
    if owned.is_empty() {
        out.push_str("\nNo open findings.\n");
    } else {
        out.push('\n');
        for f in &owned {
            let mark = match f.severity {
                Severity::Error => "[!]",
                _ => "[ ]",
            };
            out.push_str(&format!("- {} {}:{} {}\n", mark, f.file, f.line, f.message));
        }
    }
    out.push_str(NOTES_END);
    out
}

/// Replace (or append) the sentinel-delimited audit block in the notes file.
/// Injection is idempotent: running twice with the same findings leaves the
/// file byte-identical. Content outside the markers is never touched.
pub fn inject_notes(project_path: &Path, findings: &[Finding]) -> anyhow::Result<()> {
    let path = notes_file(project_path);
    let existing = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    let block = notes_block(findings);
    let updated = match (existing.find(NOTES_START), existing.find(NOTES_END)) {
        (Some(start), Some(end)) if end >= start => {
            let after = end + NOTES_END.len();
            format!("{}{}{}", &existing[..start], block, &existing[after..])
        }
        _ => {
            let mut s = existing;
            if !s.is_empty() && !s.ends_with('\n') {
                s.push('\n');
            }
            if !s.is_empty() {
                s.push('\n');
            }
            s.push_str(&block);
            s.push('\n');
            s
        }
    };

    // Write-then-rename so a crash never leaves a half-written notes file.
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("md.tmp");
    std::fs::write(&tmp, updated)?;
    std::fs::rename(&tmp, &path)?;
    Ok(())
}
