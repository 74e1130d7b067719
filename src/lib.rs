//! Stackaudit - cross-language monorepo drift auditor.
//!
//! Stackaudit reads a repository holding a backend and a frontend in
//! different languages, extracts normalized facts from both sides with
//! lexical scanning (no full parsers), and reconciles them: schema fields
//! across the language boundary, declared routes, test coverage by feature
//! area, and dependency manifests. Disagreements become `Finding`s rendered
//! to the console, JSON, an HTML dashboard, or a notes block in the
//! project's todo file.
//!
//! # Architecture
//!
//! Data flows one direction, facts never flow back into extraction:
//!
//! - `scan`: delimiter-matching lexical scanner, string- and comment-aware
//! - `extract`: per-dialect extractors producing `Schema`, `Route`,
//!   `TestSuite`, and `Dependency` facts
//! - `normalize`: name-casing, type-compatibility, and constraint mapping
//! - `audit`: auditors consuming facts, plus the runner and `Finding` model
//! - `probe`: bounded-concurrency read-only live endpoint probe
//! - `report` / `html`: output surfaces
//! - `config`: validated per-invocation configuration
//!
//! # Adding an auditor
//!
//! Implement `audit::Auditor` against a borrowed `AuditConfig` and register
//! it in `audit::run_audits`. Auditors must be deterministic and must not
//! mutate the project under audit (the quality auditor's `--fix` pass is the
//! one sanctioned exception).

pub mod audit;
pub mod cli;
pub mod config;
pub mod extract;
pub mod html;
pub mod normalize;
pub mod probe;
pub mod report;
pub mod scan;

pub use audit::{run_audits, AuditKind, AuditOutcome, Auditor, Finding, Severity};
pub use config::{AuditConfig, ConfigError};
pub use extract::{Dependency, Field, Manifest, Route, Schema, TestCase, TestSuite};
