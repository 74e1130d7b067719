//! Frontend fluent validation-schema extraction (Zod `z.object({...})` style).

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::types::{Field, Schema, SourceLanguage};
use super::SchemaExtractor;
use crate::scan::{self, CommentStyle};

static SCHEMA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)(?:export\s+)?(?:const|let)\s+(\w+)\s*=\s*z\.object\(\s*\{").unwrap()
});

static FIELD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\w+)\s*:\s*(z\..+)$").unwrap());

static BASE_TYPE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^z\.(\w+)\(").unwrap());

static CALL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.(\w+)\(([^)]*)\)").unwrap());

/// Chained calls that carry validation semantics onto the fact.
const CONSTRAINT_CALLS: &[&str] = &["min", "max", "length", "email", "url", "regex", "uuid"];

pub struct ValidatorExtractor;

impl SchemaExtractor for ValidatorExtractor {
    fn extract(&self, file: &str, text: &str) -> Vec<Schema> {
        let mut schemas = Vec::new();

        for caps in SCHEMA_RE.captures_iter(text) {
            let m = caps.get(0).unwrap();
            let open_idx = m.end() - 1;
            let body = match scan::block_body(text, open_idx, CommentStyle::Curly) {
                Some(b) => b,
                None => continue,
            };
            let body_start = scan::line_at(text, open_idx);

            let mut fields = Vec::new();
            for part in scan::split_top_level(body, ',') {
                let line = body_start + line_offset_of(body, part);
                if let Some(field) = parse_field(part.trim(), line) {
                    fields.push(field);
                }
            }

            schemas.push(Schema {
                name: caps[1].to_string(),
                fields,
                file: file.to_string(),
                line: scan::line_at(text, m.start()),
                language: SourceLanguage::Validator,
            });
        }

        schemas
    }
}

fn line_offset_of(body: &str, part: &str) -> usize {
    let offset = part.as_ptr() as usize - body.as_ptr() as usize;
    body[..offset.min(body.len())].matches('\n').count()
}

fn parse_field(stmt: &str, line: usize) -> Option<Field> {
    let caps = FIELD_RE.captures(stmt)?;
    let name = caps[1].to_string();
    let chain = caps[2].trim().trim_end_matches(',').to_string();

    let raw_type = BASE_TYPE_RE
        .captures(&chain)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let optional = chain.contains(".optional()") || chain.contains(".nullable()");

    let mut constraints = BTreeMap::new();
    for cm in CALL_RE.captures_iter(&chain) {
        let call = &cm[1];
        if CONSTRAINT_CALLS.contains(&call) {
            let arg = cm[2].trim().trim_matches(|c| c == '\'' || c == '"');
            let value = if arg.is_empty() { "true" } else { arg };
            constraints.insert(call.to_string(), value.to_string());
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

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Vec<Schema> {
        ValidatorExtractor.extract("schemas.ts", text)
    }

    #[test]
    fn test_basic_object() {
        let schemas = extract(
            "export const userSchema = z.object({\n  id: z.number(),\n  email: z.string().email(),\n});\n",
        );
        assert_eq!(schemas.len(), 1);
        let s = &schemas[0];
        assert_eq!(s.name, "userSchema");
        assert_eq!(s.fields.len(), 2);
        assert_eq!(s.field("id").unwrap().raw_type, "number");
        assert_eq!(s.field("email").unwrap().constraints.get("email").unwrap(), "true");
    }

    #[test]
    fn test_min_max_constraints() {
        let schemas = extract(
            "const signupSchema = z.object({\n  username: z.string().min(3).max(32),\n});\n",
        );
        let f = schemas[0].field("username").unwrap();
        assert_eq!(f.constraints.get("min").unwrap(), "3");
        assert_eq!(f.constraints.get("max").unwrap(), "32");
    }

    #[test]
    fn test_optional_and_nullable() {
        let schemas = extract(
            "const s = z.object({\n  bio: z.string().optional(),\n  age: z.number().nullable(),\n  name: z.string(),\n});\n",
        );
        let s = &schemas[0];
        assert!(s.field("bio").unwrap().optional);
        assert!(s.field("age").unwrap().optional);
        assert!(!s.field("name").unwrap().optional);
    }

    #[test]
    fn test_nested_object_field_counts_once() {
        let schemas = extract(
            "const s = z.object({\n  meta: z.object({ created: z.string() }),\n  id: z.number(),\n});\n",
        );
        let names: Vec<_> = schemas[0].fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["meta", "id"]);
        assert_eq!(schemas[0].field("meta").unwrap().raw_type, "object");
    }

    #[test]
    fn test_refine_chain_keeps_following_fields() {
        let schemas = extract(
            "const s = z.object({\n  slug: z.string().refine((v) => v.length > 2),\n  id: z.number(),\n});\n",
        );
        let names: Vec<_> = schemas[0].fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["slug", "id"]);
    }

    #[test]
    fn test_no_schemas() {
        assert!(extract("const x = 1;\n").is_empty());
    }

    #[test]
    fn test_unterminated_skipped() {
        assert!(extract("const s = z.object({\n  id: z.number(),\n").is_empty());
    }
}
