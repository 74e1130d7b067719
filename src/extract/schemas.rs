//! Backend declarative-class schema extraction (Pydantic style).
//!
//! Locates `class Name(Schema):` headers, isolates the indented body, and
//! parses annotated field statements. A field that fails to parse is skipped;
//! a file with no declarations yields nothing. Never errors.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::types::{Field, Schema, SourceLanguage};
use super::SchemaExtractor;
use crate::scan;

static CLASS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^class\s+(\w+)\s*\(\s*(?:Schema|BaseModel|ModelSchema)\s*\)\s*:").unwrap()
});

static FIELD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+)\s*:\s*(.+?)(?:\s*=\s*(.+))?\s*$").unwrap());

static OPTIONAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Optional\[(.+)\]$|^(.+?)\s*\|\s*None$|^None\s*\|\s*(.+)$").unwrap());

static CONSTRAINT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w+)\s*=\s*([^,)]+)").unwrap());

/// Constraint keywords carried onto the fact; everything else in `Field(...)`
/// is presentation-only.
const CONSTRAINT_KEYS: &[&str] = &[
    "min_length",
    "max_length",
    "ge",
    "le",
    "gt",
    "lt",
    "pattern",
    "regex",
];

pub struct BackendClassExtractor;

impl SchemaExtractor for BackendClassExtractor {
    fn extract(&self, file: &str, text: &str) -> Vec<Schema> {
        let mut schemas = Vec::new();

        for caps in CLASS_RE.captures_iter(text) {
            let m = caps.get(0).unwrap();
            let name = caps[1].to_string();
            let header_line = scan::line_at(text, m.start());

            let mut fields = Vec::new();
            for (line, stmt) in class_body(text, m.end(), header_line) {
                if let Some(field) = parse_field(&stmt, line) {
                    fields.push(field);
                }
            }

            schemas.push(Schema {
                name,
                fields,
                file: file.to_string(),
                line: header_line,
                language: SourceLanguage::Backend,
            });
        }

        schemas
    }
}

/// Indented statements following the class header with their 1-based source
/// lines, up to the first non-indented non-blank line. Indentation is the
/// block delimiter in this dialect, so the brace scanner does not apply;
/// continuation lines inside parentheses are folded into the statement that
/// opened them, which keeps the line of the opening token.
fn class_body(text: &str, header_end: usize, header_line: usize) -> Vec<(usize, String)> {
    let rest = &text[header_end..];
    let mut statements: Vec<(usize, String)> = Vec::new();
    let mut open_parens = 0i32;

    for (idx, line) in rest.lines().enumerate() {
        if idx == 0 {
            // remainder of the header line
            continue;
        }
        let trimmed = line.trim();
        if open_parens > 0 {
            if let Some((_, last)) = statements.last_mut() {
                last.push(' ');
                last.push_str(trimmed);
            }
            open_parens += paren_delta(trimmed);
            continue;
        }
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if !line.starts_with("    ") {
            break;
        }
        statements.push((header_line + idx, trimmed.to_string()));
        open_parens += paren_delta(trimmed);
    }

    statements
}

fn paren_delta(line: &str) -> i32 {
    let mut delta = 0;
    let mut in_string: Option<char> = None;
    for ch in line.chars() {
        if let Some(q) = in_string {
            if ch == q {
                in_string = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => in_string = Some(ch),
            '(' | '[' => delta += 1,
            ')' | ']' => delta -= 1,
            '#' => break,
            _ => {}
        }
    }
    delta
}

fn parse_field(stmt: &str, line: usize) -> Option<Field> {
    let caps = FIELD_RE.captures(stmt)?;
    let name = caps[1].to_string();
    let raw = caps[2].trim().to_string();
    let default = caps.get(3).map(|m| m.as_str().trim().to_string());

    // Not field statements: nested classes, methods, private attrs.
    if name.starts_with('_') || matches!(name.as_str(), "class" | "def" | "Meta" | "Config") {
        return None;
    }

    let (raw_type, mut optional) = strip_optional(&raw);
    if let Some(d) = &default {
        if d == "None" {
            optional = true;
        }
    }

    let mut constraints = BTreeMap::new();
    if let Some(d) = &default {
        if d.contains("Field(") {
            for cm in CONSTRAINT_RE.captures_iter(d) {
                let key = cm[1].trim();
                if CONSTRAINT_KEYS.contains(&key) {
                    constraints.insert(key.to_string(), cm[2].trim().to_string());
                }
            }
        }
    }

    Some(Field {
        name,
        raw_type,
        optional,
        constraints,
        line,
    })
}

/// Unwrap `Optional[T]` / `T | None`, reporting whether the wrapper was there.
fn strip_optional(raw: &str) -> (String, bool) {
    if let Some(caps) = OPTIONAL_RE.captures(raw) {
        let inner = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_else(|| raw.to_string());
        return (inner, true);
    }
    (raw.to_string(), false)
}
