//! Type reconciliation across the language boundary.
//!
//! For each backend schema the auditor finds the best-matching frontend
//! schema (exact normalized name first, suffix-stripped fallback only when
//! exactly one candidate qualifies) and diffs fields by normalized name.
//!
//! The asymmetry is intentional: a backend field missing from the frontend
//! is an error, a frontend-only field is never flagged, since the frontend
//! may carry derived or local-only fields.

use crate::audit::types::{AuditKind, Finding, Severity};
use crate::audit::{read_source, Auditor};
use crate::config::AuditConfig;
use crate::extract::{
    files, BackendClassExtractor, Field, InterfaceExtractor, Schema, SchemaExtractor,
    ValidatorExtractor,
};
use crate::normalize;

pub struct ReconcileAuditor<'a> {
    config: &'a AuditConfig,
}

impl<'a> ReconcileAuditor<'a> {
    pub fn new(config: &'a AuditConfig) -> Self {
        Self { config }
    }

    fn collect<E: SchemaExtractor>(
        &self,
        extractor: &E,
        paths: Vec<std::path::PathBuf>,
        findings: &mut Vec<Finding>,
    ) -> Vec<Schema> {
        let mut schemas = Vec::new();
        for path in paths {
            let rel = files::rel_display(&self.config.project_path, &path);
            let Some(text) = read_source(&path, &rel, AuditKind::Types, findings) else {
                continue;
            };
            schemas.extend(extractor.extract(&rel, &text));
        }
        schemas
    }
}

impl Auditor for ReconcileAuditor<'_> {
    fn kind(&self) -> AuditKind {
        AuditKind::Types
    }

    fn run(&self) -> Vec<Finding> {
        let mut findings = Vec::new();
        let root = &self.config.project_path;

        let backend = self.collect(&BackendClassExtractor, files::schema_files(root), &mut findings);
        let interfaces =
            self.collect(&InterfaceExtractor, files::interface_files(root), &mut findings);
        let validators =
            self.collect(&ValidatorExtractor, files::validator_files(root), &mut findings);

        if backend.is_empty() {
            findings.push(Finding::new(
                AuditKind::Types,
                Severity::Info,
                ".",
                0,
                "No backend schemas found",
                "Define schemas in */schemas/*.py or models.py",
            ));
            return findings;
        }

        let frontend: Vec<&Schema> = interfaces.iter().chain(validators.iter()).collect();

        for schema in &backend {
            if let Some(matched) = match_frontend(schema, &frontend) {
                reconcile_pair(schema, matched, &mut findings);
            } else {
                findings.push(Finding::new(
                    AuditKind::Types,
                    Severity::Warning,
                    schema.file.clone(),
                    schema.line,
                    format!("Backend schema '{}' has no frontend counterpart", schema.name),
                    format!("Declare 'interface {}' in the frontend types", schema.name),
                ));
            }
        }

        findings
    }
}

/// Locate the frontend schema for a backend schema. Exact normalized match
/// wins; suffix-stripped fallback is accepted only when exactly one frontend
/// candidate qualifies. Ambiguity is skipped without a finding to avoid
/// heuristic over-matching.
fn match_frontend<'s>(backend: &Schema, frontend: &[&'s Schema]) -> Option<&'s Schema> {
    for candidate_name in normalize::schema_name_candidates(&backend.name) {
        let hits: Vec<&'s Schema> = frontend
            .iter()
            .copied()
            .filter(|f| normalize::schema_names_equal(&candidate_name, &f.name))
            .collect();
        match hits.len() {
            1 => return Some(hits[0]),
            0 => continue,
            // Multiple frontend declarations share the name; exact backend
            // name still wins, a fuzzy candidate does not.
            _ if candidate_name == backend.name => return Some(hits[0]),
            _ => return None,
        }
    }
    None
}

/// Diff one matched backend/frontend pair, field by field.
fn reconcile_pair(backend: &Schema, frontend: &Schema, findings: &mut Vec<Finding>) {
    for bf in &backend.fields {
        let Some(ff) = frontend
            .fields
            .iter()
            .find(|ff| normalize::names_match(&bf.name, &ff.name))
        else {
            let camel = normalize::snake_to_camel(&bf.name);
            findings.push(Finding::new(
                AuditKind::Types,
                Severity::Error,
                frontend.file.clone(),
                frontend.line,
                format!(
                    "Field '{}' of backend '{}' is absent in frontend '{}'",
                    bf.name, backend.name, frontend.name
                ),
                format!("Add '{}' to {}", camel, frontend.name),
            ));
            continue;
        };

        check_types(backend, frontend, bf, ff, findings);
        check_optionality(backend, frontend, bf, ff, findings);
        check_constraints(backend, frontend, bf, ff, findings);
    }
    // Frontend-only fields are deliberately not flagged.
}

fn check_types(
    backend: &Schema,
    frontend: &Schema,
    bf: &Field,
    ff: &Field,
    findings: &mut Vec<Finding>,
) {
    if !normalize::types_compatible(&bf.raw_type, &ff.raw_type) {
        findings.push(Finding::new(
            AuditKind::Types,
            Severity::Error,
            frontend.file.clone(),
            ff.line,
            format!(
                "Type incompatible: '{}.{}' is '{}' but '{}.{}' is '{}'",
                backend.name, bf.name, bf.raw_type, frontend.name, ff.name, ff.raw_type
            ),
            format!("Align '{}' with the backend type '{}'", ff.name, bf.raw_type),
        ));
    }
}

fn check_optionality(
    backend: &Schema,
    frontend: &Schema,
    bf: &Field,
    ff: &Field,
    findings: &mut Vec<Finding>,
) {
    if bf.optional != ff.optional {
        let (b_desc, f_desc) = if bf.optional {
            ("optional", "required")
        } else {
            ("required", "optional")
        };
        findings.push(Finding::new(
            AuditKind::Types,
            Severity::Warning,
            frontend.file.clone(),
            ff.line,
            format!(
                "Optionality disagrees: '{}.{}' is {} in the backend but {} in '{}'",
                backend.name, bf.name, b_desc, f_desc, frontend.name
            ),
            format!("Make '{}' {} on the frontend", ff.name, b_desc),
        ));
    }
}

/// Constraints are advisory: present on one side and absent on the other is
/// a warning, never an error.
fn check_constraints(
    backend: &Schema,
    frontend: &Schema,
    bf: &Field,
    ff: &Field,
    findings: &mut Vec<Finding>,
) {
    for (kind, value) in &bf.constraints {
        let Some(equivalent) = normalize::frontend_constraint_for(kind) else {
            continue;
        };
        match ff.constraints.get(equivalent) {
            None => findings.push(Finding::new(
                AuditKind::Types,
                Severity::Warning,
                frontend.file.clone(),
                ff.line,
                format!(
                    "Constraint missing: '{}.{}' has {}={} but '{}.{}' has no .{}()",
                    backend.name, bf.name, kind, value, frontend.name, ff.name, equivalent
                ),
                format!("Add .{}({}) to match backend validation", equivalent, value),
            )),
            Some(fv) if fv != value => findings.push(Finding::new(
                AuditKind::Types,
                Severity::Warning,
                frontend.file.clone(),
                ff.line,
                format!(
                    "Constraint disagrees: '{}.{}' has {}={} but '{}.{}' has .{}({})",
                    backend.name, bf.name, kind, value, frontend.name, ff.name, equivalent, fv
                ),
                format!("Align .{}() with the backend value {}", equivalent, value),
            )),
            Some(_) => {}
        }
    }
}
