//! Name-casing, type-compatibility, and constraint mapping shared by all
//! reconciliation logic.
//!
//! Name comparison is insensitive to the snake_case/camelCase convention and
//! nothing else; any other spelling difference is a true mismatch. Type
//! compatibility fails open: an unknown backend type is compatible with any
//! frontend type unless that type is a known-incompatible primitive.

use once_cell::sync::Lazy;
use regex::Regex;

static SNAKE_SEG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"_([a-z0-9])").unwrap());
static UPPER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Z])").unwrap());

/// `created_at` -> `createdAt`.
pub fn snake_to_camel(name: &str) -> String {
    SNAKE_SEG_RE
        .replace_all(name, |caps: &regex::Captures| caps[1].to_uppercase())
        .into_owned()
}

/// `createdAt` -> `created_at`.
pub fn camel_to_snake(name: &str) -> String {
    UPPER_RE
        .replace_all(name, |caps: &regex::Captures| format!("_{}", caps[1].to_lowercase()))
        .trim_start_matches('_')
        .to_string()
}

/// True when two field names differ only by the one casing convention.
pub fn names_match(backend: &str, frontend: &str) -> bool {
    backend == frontend
        || snake_to_camel(backend) == frontend
        || backend == camel_to_snake(frontend)
}

/// Frontend primitive tokens that are never interchangeable with each other.
const KNOWN_FRONTEND_PRIMITIVES: &[&str] = &["string", "number", "boolean"];

/// Acceptable frontend tokens for each backend primitive token.
fn accepted_frontend(backend: &str) -> Option<&'static [&'static str]> {
    Some(match backend {
        "str" | "text" => &["string", "text"],
        "int" | "float" | "Decimal" => &["number"],
        "bool" => &["boolean"],
        "datetime" | "date" | "time" => &["string", "Date", "date"],
        "UUID" | "uuid" => &["string", "uuid"],
        "bytes" => &["string"],
        "dict" | "Dict" => &["object", "Record", "record"],
        "Any" => return None, // explicitly anything
        _ => return None,
    })
}

/// One level of container-shape parsing: `list[T]`/`List[T]` and
/// `T[]`/`Array<T>` compare by element compatibility.
fn element_type(token: &str) -> Option<&str> {
    let t = token.trim();
    if let Some(inner) = t
        .strip_prefix("list[")
        .or_else(|| t.strip_prefix("List["))
        .and_then(|s| s.strip_suffix(']'))
    {
        return Some(inner.trim());
    }
    if let Some(inner) = t.strip_suffix("[]") {
        return Some(inner.trim());
    }
    if let Some(inner) = t
        .strip_prefix("Array<")
        .or_else(|| t.strip_prefix("array<"))
        .and_then(|s| s.strip_suffix('>'))
    {
        return Some(inner.trim());
    }
    None
}

/// Whether a backend type token is compatible with a frontend type token.
pub fn types_compatible(backend: &str, frontend: &str) -> bool {
    let b = backend.trim();
    let f = frontend.trim();

    // Containers compare by shape, recursing one level into elements.
    match (element_type(b), element_type(f)) {
        (Some(be), Some(fe)) => return types_compatible(be, fe),
        (Some(_), None) | (None, Some(_)) => {
            // One side is a container, the other is not. A validator-dialect
            // `array` token has no element type; accept it against any list.
            return f == "array" || b == "array";
        }
        (None, None) => {}
    }

    match accepted_frontend(b) {
        Some(accepted) => accepted.iter().any(|t| f == *t || f.starts_with(t)),
        // Unknown backend type: fail open unless the frontend side is a
        // known primitive the backend token clearly is not.
        None => !KNOWN_FRONTEND_PRIMITIVES.contains(&f) || b.eq_ignore_ascii_case(f),
    }
}

/// Constraint-kind pairs considered equivalent across the boundary,
/// backend keyword first.
const CONSTRAINT_EQUIV: &[(&str, &str)] = &[
    ("min_length", "min"),
    ("max_length", "max"),
    ("ge", "min"),
    ("le", "max"),
    ("gt", "min"),
    ("lt", "max"),
    ("pattern", "regex"),
    ("regex", "regex"),
];

/// Frontend constraint keyword equivalent to a backend constraint keyword.
pub fn frontend_constraint_for(backend_kind: &str) -> Option<&'static str> {
    CONSTRAINT_EQUIV
        .iter()
        .find(|(b, _)| *b == backend_kind)
        .map(|(_, f)| *f)
}

/// Suffixes stripped when fuzzy-matching schema names (`UserOut` -> `User`).
const NAME_SUFFIXES: &[&str] = &["Out", "In", "Schema", "Response", "Request", "Create", "Update"];

/// Candidate base names for a schema name, most specific first. The exact
/// name is always the first candidate.
pub fn schema_name_candidates(name: &str) -> Vec<String> {
    let mut candidates = vec![name.to_string()];
    for suffix in NAME_SUFFIXES {
        if let Some(base) = name.strip_suffix(suffix) {
            if !base.is_empty() && !candidates.iter().any(|c| c == base) {
                candidates.push(base.to_string());
            }
        }
    }
    candidates
}

/// Case-insensitive schema-name equality that also ignores a trailing
/// `Schema` marker on the frontend side (`User` ~ `userSchema`).
pub fn schema_names_equal(backend: &str, frontend: &str) -> bool {
    let f = frontend.strip_suffix("Schema").unwrap_or(frontend);
    let b = backend.strip_suffix("Schema").unwrap_or(backend);
    b.eq_ignore_ascii_case(f)
}
