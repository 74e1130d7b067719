//! Dependency-manifest extraction.
//!
//! pyproject.toml is scanned section- and line-oriented on purpose: the
//! files being audited are generated and frequently half-broken, and a strict
//! TOML parse would turn one bad line into zero facts. package.json is plain
//! object traversal via serde_json; line numbers are recovered by key search.

use once_cell::sync::Lazy;
use regex::Regex;

use super::types::{Dependency, Manifest};
use crate::scan;

static SECTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\[([^\]]+)\]\s*$").unwrap());

static DEP_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-zA-Z0-9][a-zA-Z0-9_.\-]*)(?:\[[^\]]*\])?(.*)$").unwrap());

/// Sections whose `dependencies = [...]` arrays hold runtime deps.
const RUNTIME_SECTIONS: &[&str] = &["project"];
/// Sections whose dependency arrays are dev-scoped.
const DEV_SECTIONS: &[&str] = &["project.optional-dependencies", "tool.uv", "tool.uv.dev-dependencies"];

/// Parse a pyproject.toml-dialect manifest.
pub fn parse_pyproject(file: &str, text: &str) -> Manifest {
    let mut manifest = Manifest {
        file: file.to_string(),
        dependencies: Vec::new(),
    };

    let sections: Vec<(String, usize, usize)> = {
        let headers: Vec<_> = SECTION_RE.captures_iter(text).collect();
        headers
            .iter()
            .enumerate()
            .map(|(i, caps)| {
                let end = headers
                    .get(i + 1)
                    .map(|next| next.get(0).unwrap().start())
                    .unwrap_or(text.len());
                (
                    caps[1].to_string(),
                    caps.get(0).unwrap().end(),
                    end,
                )
            })
            .collect()
    };

    for (name, start, end) in sections {
        let dev = DEV_SECTIONS.contains(&name.as_str());
        if !dev && !RUNTIME_SECTIONS.contains(&name.as_str()) {
            continue;
        }
        let section = &text[start..end];
        for list in dep_lists(section, dev) {
            for (offset, raw) in list_entries(section, list) {
                if let Some(dep) = parse_dep_entry(raw, file, scan::line_at(text, start + offset), dev) {
                    manifest.dependencies.push(dep);
                }
            }
        }
    }

    manifest
}

/// Byte ranges of the dependency arrays in a section. Runtime sections carry
/// deps only under a `dependencies`-suffixed key; metadata arrays such as
/// `keywords` or `classifiers` live alongside them and are not facts. Dev
/// sections group deps under arbitrary keys (`dev = [...]`, `test = [...]`).
fn dep_lists(section: &str, any_key: bool) -> Vec<(usize, usize)> {
    static DEPS_KEY_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?m)^[\w\-]*dependencies\s*=\s*\[").unwrap());
    static ANY_KEY_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?m)^[\w\-]+\s*=\s*\[").unwrap());

    let re: &Regex = if any_key { &*ANY_KEY_RE } else { &*DEPS_KEY_RE };
    re.find_iter(section)
        .filter_map(|m| {
            let open = section[m.start()..].find('[')? + m.start();
            let close = scan::matching_delimiter(section, open, scan::CommentStyle::Hash)?;
            Some((open + 1, close))
        })
        .collect()
}

/// Quoted entries of a list with their byte offsets in the section.
fn list_entries<'a>(section: &'a str, range: (usize, usize)) -> Vec<(usize, &'a str)> {
    let (start, end) = range;
    let body = &section[start..end];
    let mut entries = Vec::new();
    let mut cursor = 0usize;

    for line in body.lines() {
        let trimmed = line.trim().trim_end_matches(',');
        let offset = start + cursor + (line.len() - line.trim_start().len());
        cursor += line.len() + 1;
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let unquoted = trimmed
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .or_else(|| trimmed.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')));
        if let Some(entry) = unquoted {
            entries.push((offset, entry));
        }
    }

    entries
}

fn parse_dep_entry(raw: &str, file: &str, line: usize, dev: bool) -> Option<Dependency> {
    let caps = DEP_NAME_RE.captures(raw.trim())?;
    let name = caps[1].to_string();
    if name.is_empty() {
        return None;
    }
    Some(Dependency {
        name,
        constraint: caps[2].trim().to_string(),
        dev,
        file: file.to_string(),
        line,
    })
}

/// Parse a package.json-dialect manifest.
pub fn parse_package_json(file: &str, text: &str) -> Manifest {
    let mut manifest = Manifest {
        file: file.to_string(),
        dependencies: Vec::new(),
    };

    let Ok(value) = serde_json::from_str::<serde_json::Value>(text) else {
        return manifest; // malformed manifest yields no facts
    };

    for (section, dev) in [("dependencies", false), ("devDependencies", true)] {
        let Some(obj) = value.get(section).and_then(|v| v.as_object()) else {
            continue;
        };
        for (name, version) in obj {
            let constraint = version.as_str().unwrap_or("").to_string();
            manifest.dependencies.push(Dependency {
                name: name.clone(),
                constraint,
                dev,
                file: file.to_string(),
                line: key_line(text, name),
            });
        }
    }

    manifest
}

fn key_line(text: &str, key: &str) -> usize {
    let needle = format!("\"{}\"", key);
    text.lines()
        .position(|l| l.contains(&needle))
        .map(|i| i + 1)
        .unwrap_or(1)
}

/// Dispatch on manifest filename.
pub fn parse_manifest(file: &str, text: &str) -> Manifest {
    if file.ends_with("package.json") {
        parse_package_json(file, text)
    } else {
        parse_pyproject(file, text)
    }
}
