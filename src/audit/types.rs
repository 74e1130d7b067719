//! The Finding model shared by every auditor and the reporting layer.

use serde::{Deserialize, Serialize};

/// Severity levels for findings. `error > warning > info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Inclusive threshold test: does this severity meet `min`?
    pub fn at_least(&self, min: Severity) -> bool {
        // Ord derives Error < Warning < Info from declaration order.
        *self <= min
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning" => Ok(Severity::Warning),
            "info" => Ok(Severity::Info),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// Which auditor produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditKind {
    Types,
    Endpoints,
    Tests,
    Dependencies,
    Vulnerabilities,
    Quality,
    Plugin,
}

impl AuditKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditKind::Types => "types",
            AuditKind::Endpoints => "endpoints",
            AuditKind::Tests => "tests",
            AuditKind::Dependencies => "dependencies",
            AuditKind::Vulnerabilities => "vulnerabilities",
            AuditKind::Quality => "quality",
            AuditKind::Plugin => "plugin",
        }
    }

    /// Kinds selectable from the CLI (`plugin` findings come from plugin
    /// units, which run whenever any audit runs).
    pub const SELECTABLE: &'static [AuditKind] = &[
        AuditKind::Types,
        AuditKind::Endpoints,
        AuditKind::Tests,
        AuditKind::Dependencies,
        AuditKind::Vulnerabilities,
        AuditKind::Quality,
    ];
}

impl std::fmt::Display for AuditKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AuditKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "types" => Ok(AuditKind::Types),
            "endpoints" => Ok(AuditKind::Endpoints),
            "tests" => Ok(AuditKind::Tests),
            "dependencies" => Ok(AuditKind::Dependencies),
            "vulnerabilities" => Ok(AuditKind::Vulnerabilities),
            "quality" => Ok(AuditKind::Quality),
            "plugin" => Ok(AuditKind::Plugin),
            _ => Err(format!("unknown audit type: {}", s)),
        }
    }
}

/// One reported issue. Value object: never mutated after creation, only
/// filtered and sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: AuditKind,
    pub severity: Severity,
    pub file: String,
    pub line: usize,
    pub message: String,
    #[serde(default)]
    pub suggestion: String,
}

impl Finding {
    pub fn new(
        kind: AuditKind,
        severity: Severity,
        file: impl Into<String>,
        line: usize,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            file: file.into(),
            line,
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }
}

/// Deterministic ordering: file, then line, then message. Never dependent on
/// file-system enumeration order.
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        a.file
            .cmp(&b.file)
            .then_with(|| a.line.cmp(&b.line))
            .then_with(|| a.message.cmp(&b.message))
    });
}
