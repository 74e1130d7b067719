//! Extractors that turn heterogeneous source text into normalized facts.
//!
//! Data flows one direction: source text -> facts. Extractors are best-effort
//! and fail open: a declaration that cannot be parsed is skipped, a file with
//! no declarations yields an empty result, never an error.

pub mod files;
pub mod interfaces;
pub mod manifests;
pub mod routes;
pub mod schemas;
pub mod types;
pub mod validators;

pub use interfaces::InterfaceExtractor;
pub use schemas::BackendClassExtractor;
pub use types::{
    ConstraintKind, Dependency, Field, Manifest, Route, Schema, SourceLanguage, TestCase,
    TestDialect, TestSuite,
};
pub use validators::ValidatorExtractor;

/// Capability every schema extractor provides, one variant per dialect.
pub trait SchemaExtractor {
    fn extract(&self, file: &str, text: &str) -> Vec<Schema>;
}
