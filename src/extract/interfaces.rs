//! Frontend structural-interface extraction (TypeScript `interface` style).

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::types::{Field, Schema, SourceLanguage};
use super::SchemaExtractor;
use crate::scan::{self, CommentStyle};

static INTERFACE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(?:export\s+)?interface\s+(\w+)(?:\s+extends\s+\w+)?\s*\{").unwrap()
});

static FIELD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:readonly\s+)?(\w+)(\?)?\s*:\s*(.+?)\s*;?$").unwrap());

static NULLABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\|\s*(?:null|undefined)\s*$").unwrap());

pub struct InterfaceExtractor;

impl SchemaExtractor for InterfaceExtractor {
    fn extract(&self, file: &str, text: &str) -> Vec<Schema> {
        let mut schemas = Vec::new();

        for caps in INTERFACE_RE.captures_iter(text) {
            let m = caps.get(0).unwrap();
            let open_idx = m.end() - 1;
            let body = match scan::block_body(text, open_idx, CommentStyle::Curly) {
                Some(b) => b,
                None => continue, // unterminated declaration, no facts
            };
            let header_line = scan::line_at(text, m.start());
            let body_start = scan::line_at(text, open_idx);

            schemas.push(Schema {
                name: caps[1].to_string(),
                fields: parse_fields(body, body_start),
                file: file.to_string(),
                line: header_line,
                language: SourceLanguage::Interface,
            });
        }

        schemas
    }
}

/// Interface bodies are semicolon/newline delimited; split on newlines and
/// let nested object types fall out as parse misses on their inner lines.
fn parse_fields(body: &str, body_start_line: usize) -> Vec<Field> {
    let mut fields = Vec::new();
    let mut depth = 0i32;

    for (i, line) in body.lines().enumerate() {
        let trimmed = line.trim();
        if depth > 0 {
            depth += brace_delta(trimmed);
            continue;
        }
        if trimmed.is_empty() || trimmed.starts_with("//") || trimmed.starts_with('*') {
            continue;
        }

        if let Some(caps) = FIELD_RE.captures(trimmed) {
            let mut raw_type = caps[3].trim().trim_end_matches(';').trim().to_string();
            let mut optional = caps.get(2).is_some();
            if NULLABLE_RE.is_match(&raw_type) {
                optional = true;
                raw_type = NULLABLE_RE.replace(&raw_type, "").trim().trim_end_matches('|').trim().to_string();
            }
            fields.push(Field {
                name: caps[1].to_string(),
                raw_type,
                optional,
                constraints: BTreeMap::new(),
                line: body_start_line + i,
            });
        }
        depth += brace_delta(trimmed);
    }

    fields
}

fn brace_delta(line: &str) -> i32 {
    let mut delta = 0;
    for ch in line.chars() {
        match ch {
            '{' => delta += 1,
            '}' => delta -= 1,
            _ => {}
        }
    }
    delta
}
