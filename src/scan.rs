//! Brace/string/comment-aware lexical scanning.
//!
//! Every extractor slices declaration bodies out of free text with this
//! module instead of a full parser. The scanner tracks string literals and
//! comments for the target language family so that delimiters inside them
//! never count toward nesting depth. Malformed input (no matching closer)
//! returns `None`, which callers treat as "no extractable facts".

/// Comment conventions of the language family being scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `//` line comments and `/* */` block comments (TypeScript, JS).
    Curly,
    /// `#` line comments (Python).
    Hash,
}

fn closer_for(open: char) -> Option<char> {
    match open {
        '{' => Some('}'),
        '(' => Some(')'),
        '[' => Some(']'),
        _ => None,
    }
}

/// Find the index of the delimiter matching the opener at `open_idx`.
///
/// Supports `{`, `(`, and `[` with unbounded nesting. Delimiters inside
/// string literals (`'`, `"`, and backtick for curly-family) and comments are
/// skipped. Returns `None` when `open_idx` is not an opening delimiter or no
/// matching closer exists before end of input.
pub fn matching_delimiter(text: &str, open_idx: usize, style: CommentStyle) -> Option<usize> {
    let bytes = text.as_bytes();
    let open = *bytes.get(open_idx)? as char;
    let close = closer_for(open)?;

    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut in_line_comment = false;
    let mut in_block_comment = false;
    let mut i = open_idx;

    while i < bytes.len() {
        let ch = bytes[i] as char;

        if in_line_comment {
            if ch == '\n' {
                in_line_comment = false;
            }
            i += 1;
            continue;
        }
        if in_block_comment {
            if ch == '*' && bytes.get(i + 1) == Some(&b'/') {
                in_block_comment = false;
                i += 2;
                continue;
            }
            i += 1;
            continue;
        }
        if let Some(quote) = in_string {
            if ch == '\\' {
                i += 2;
                continue;
            }
            if ch == quote {
                in_string = None;
            }
            i += 1;
            continue;
        }

        match ch {
            '\'' | '"' => in_string = Some(ch),
            '`' if style == CommentStyle::Curly => in_string = Some(ch),
            '/' if style == CommentStyle::Curly => {
                match bytes.get(i + 1) {
                    Some(b'/') => in_line_comment = true,
                    Some(b'*') => {
                        in_block_comment = true;
                        i += 2;
                        continue;
                    }
                    _ => {}
                }
            }
            '#' if style == CommentStyle::Hash => in_line_comment = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }

    None
}

/// Return the interior of the block opened at `open_idx`, without the
/// delimiters themselves. `None` for malformed input.
pub fn block_body(text: &str, open_idx: usize, style: CommentStyle) -> Option<&str> {
    let end = matching_delimiter(text, open_idx, style)?;
    Some(&text[open_idx + 1..end])
}

/// Split a comma-separated statement list, respecting nested `{}`, `()`,
/// `[]`, string literals, and generic `<>` pairs. Used to break schema bodies
/// into field statements without tripping over generics or inline objects.
pub fn split_top_level(body: &str, sep: char) -> Vec<&str> {
    let bytes = body.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut angle = 0i32;
    let mut in_string: Option<char> = None;
    let mut start = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        let ch = bytes[i] as char;
        if let Some(quote) = in_string {
            if ch == '\\' {
                i += 2;
                continue;
            }
            if ch == quote {
                in_string = None;
            }
            i += 1;
            continue;
        }
        let prev = if i > 0 { bytes[i - 1] as char } else { ' ' };
        match ch {
            '\'' | '"' | '`' => in_string = Some(ch),
            '{' | '(' | '[' => depth += 1,
            '}' | ')' | ']' => depth -= 1,
            // Angle brackets pair only in generic position: `Record<...>`
            // opens directly after a name. `=>`, `->`, `<=`, `>=`, and spaced
            // comparisons never count toward nesting.
            '<' if (prev.is_ascii_alphanumeric() || prev == '_')
                && bytes.get(i + 1) != Some(&b'=') =>
            {
                angle += 1;
            }
            '>' if angle > 0
                && prev != '='
                && prev != '-'
                && bytes.get(i + 1) != Some(&b'=') =>
            {
                angle -= 1;
            }
            c if c == sep && depth == 0 && angle == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(&body[start..]);
    parts
}

/// 1-based line number of a byte offset.
pub fn line_at(text: &str, offset: usize) -> usize {
    text[..offset.min(text.len())].matches('\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_nested_braces() {
        let text = "{ a: { b: 1 }, c: [2, 3] }";
        assert_eq!(
            matching_delimiter(text, 0, CommentStyle::Curly),
            Some(text.len() - 1)
        );
    }

    #[test]
    fn test_skips_braces_in_strings() {
        let text = r#"{ a: "}", b: '}' }"#;
        assert_eq!(
            matching_delimiter(text, 0, CommentStyle::Curly),
            Some(text.len() - 1)
        );
    }

    #[test]
    fn test_skips_braces_in_template_literal() {
        let text = "{ a: `closing } inside`, b: 1 }";
        assert_eq!(
            matching_delimiter(text, 0, CommentStyle::Curly),
            Some(text.len() - 1)
        );
    }

    #[test]
    fn test_skips_line_comment() {
        let text = "{\n  // not the end }\n  a: 1\n}";
        assert_eq!(
            matching_delimiter(text, 0, CommentStyle::Curly),
            Some(text.len() - 1)
        );
    }

    #[test]
    fn test_skips_block_comment() {
        let text = "{ /* } */ a: 1 }";
        assert_eq!(
            matching_delimiter(text, 0, CommentStyle::Curly),
            Some(text.len() - 1)
        );
    }

    #[test]
    fn test_hash_comment_style() {
        let text = "(\n  # closing ) in comment\n  x,\n)";
        assert_eq!(
            matching_delimiter(text, 0, CommentStyle::Hash),
            Some(text.len() - 1)
        );
    }

    #[test]
    fn test_escaped_quote_in_string() {
        let text = r#"{ a: "quote \" brace }" }"#;
        assert_eq!(
            matching_delimiter(text, 0, CommentStyle::Curly),
            Some(text.len() - 1)
        );
    }

    #[test]
    fn test_unterminated_returns_none() {
        assert_eq!(matching_delimiter("{ a: 1", 0, CommentStyle::Curly), None);
        assert_eq!(matching_delimiter("no opener", 0, CommentStyle::Curly), None);
    }

    #[test]
    fn test_brackets_and_parens() {
        assert_eq!(matching_delimiter("[1, [2]]", 0, CommentStyle::Hash), Some(7));
        assert_eq!(matching_delimiter("(a, (b))", 0, CommentStyle::Hash), Some(7));
    }

    #[test]
    fn test_block_body() {
        assert_eq!(block_body("{abc}", 0, CommentStyle::Curly), Some("abc"));
        assert_eq!(block_body("{abc", 0, CommentStyle::Curly), None);
    }

    #[test]
    fn test_split_top_level_respects_generics() {
        let parts = split_top_level("a: Record<string, number>, b: string", ',');
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].trim(), "a: Record<string, number>");
    }

    #[test]
    fn test_split_top_level_respects_nested_objects() {
        let parts = split_top_level("a: { x: 1, y: 2 }, b: [1, 2]", ',');
        assert_eq!(parts.len(), 2);
    }

    #[test]
    fn test_split_top_level_ignores_arrows_and_comparisons() {
        let parts = split_top_level(
            "a: z.string().refine((v) => v.length > 2), b: z.number()",
            ',',
        );
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1].trim(), "b: z.number()");

        let parts = split_top_level("a: x <= 1, b: y >= 2", ',');
        assert_eq!(parts.len(), 2);
    }

    #[test]
    fn test_line_at() {
        assert_eq!(line_at("a\nb\nc", 0), 1);
        assert_eq!(line_at("a\nb\nc", 2), 2);
        assert_eq!(line_at("a\nb\nc", 4), 3);
    }
}
