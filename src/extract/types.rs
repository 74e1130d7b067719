//! Normalized structural facts produced by the extractors.
//!
//! Facts are immutable once extracted; auditors only read them. Field order
//! is preserved as declared.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Source dialect a schema was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLanguage {
    /// Backend declarative class style (Pydantic).
    Backend,
    /// Frontend structural interface style (TypeScript).
    Interface,
    /// Frontend fluent validation style (Zod).
    Validator,
}

/// One named, typed member of a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Original casing is kept; comparisons normalize lazily.
    pub name: String,
    pub raw_type: String,
    pub optional: bool,
    /// Constraint kind -> value, e.g. `min_length -> 3`. BTreeMap keeps
    /// iteration deterministic.
    pub constraints: BTreeMap<String, String>,
    pub line: usize,
}

/// Normalized description of a declared data type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    pub fields: Vec<Field>,
    pub file: String,
    pub line: usize,
    pub language: SourceLanguage,
}

impl Schema {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// One HTTP-addressable handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub method: String,
    /// Path with parameters normalized to `{name}` placeholders.
    pub path: String,
    pub handler: String,
    pub requires_auth: bool,
    pub is_stub: bool,
    pub file: String,
    pub line: usize,
}

impl Route {
    /// Uniqueness key for duplicate detection.
    pub fn key(&self) -> (String, String) {
        (self.method.clone(), self.path.clone())
    }

    pub fn is_mutating(&self) -> bool {
        matches!(self.method.as_str(), "POST" | "PUT" | "PATCH" | "DELETE")
    }
}

/// Test runner convention a suite was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestDialect {
    Pytest,
    Vitest,
}

/// One test case with its heuristic feature-area labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub line: usize,
    pub assertion_count: usize,
    /// Multi-label: every matching area from the configured vocabulary.
    pub areas: BTreeSet<String>,
}

/// Test cases grouped by file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSuite {
    pub file: String,
    pub dialect: TestDialect,
    pub cases: Vec<TestCase>,
}

/// How a version constraint bounds the dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintKind {
    /// Exact version (`==1.2.3`, npm `1.2.3`).
    Pinned,
    /// Bounded range (`>=1,<2`, `^1.2`, `~1.2`).
    Ranged,
    /// Lower bound only, wildcard, or `latest`.
    Unbounded,
    /// No constraint at all.
    None,
}

/// One declared dependency from a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub constraint: String,
    pub dev: bool,
    pub file: String,
    pub line: usize,
}

impl Dependency {
    /// Classify the version constraint by pattern.
    pub fn constraint_kind(&self) -> ConstraintKind {
        let c = self.constraint.trim();
        if c.is_empty() {
            return ConstraintKind::None;
        }
        if c == "*" || c.eq_ignore_ascii_case("latest") {
            return ConstraintKind::Unbounded;
        }
        if c.starts_with("==") {
            return ConstraintKind::Pinned;
        }
        if c.starts_with('^') || c.starts_with('~') {
            return ConstraintKind::Ranged;
        }
        if c.contains(">=") && !c.contains('<') {
            return ConstraintKind::Unbounded;
        }
        if c.contains('<') || c.contains('>') {
            return ConstraintKind::Ranged;
        }
        // npm-style bare version like "1.2.3"
        if c.chars().next().is_some_and(|ch| ch.is_ascii_digit()) {
            return ConstraintKind::Pinned;
        }
        ConstraintKind::Ranged
    }
}

/// All dependencies declared in one manifest file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub file: String,
    pub dependencies: Vec<Dependency>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dep(constraint: &str) -> Dependency {
        Dependency {
            name: "pkg".to_string(),
            constraint: constraint.to_string(),
            dev: false,
            file: "pyproject.toml".to_string(),
            line: 1,
        }
    }

    #[test]
    fn test_constraint_classification() {
        assert_eq!(dep("").constraint_kind(), ConstraintKind::None);
        assert_eq!(dep("==1.2.3").constraint_kind(), ConstraintKind::Pinned);
        assert_eq!(dep("1.2.3").constraint_kind(), ConstraintKind::Pinned);
        assert_eq!(dep("^1.2.0").constraint_kind(), ConstraintKind::Ranged);
        assert_eq!(dep("~5.0").constraint_kind(), ConstraintKind::Ranged);
        assert_eq!(dep(">=1.0,<2.0").constraint_kind(), ConstraintKind::Ranged);
        assert_eq!(dep(">=1.0").constraint_kind(), ConstraintKind::Unbounded);
        assert_eq!(dep("*").constraint_kind(), ConstraintKind::Unbounded);
        assert_eq!(dep("latest").constraint_kind(), ConstraintKind::Unbounded);
    }

    #[test]
    fn test_route_mutating() {
        let mut r = Route {
            method: "GET".to_string(),
            path: "/users".to_string(),
            handler: "list_users".to_string(),
            requires_auth: false,
            is_stub: false,
            file: "api.py".to_string(),
            line: 1,
        };
        assert!(!r.is_mutating());
        r.method = "DELETE".to_string();
        assert!(r.is_mutating());
    }
}
