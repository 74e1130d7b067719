//! Project-tree file discovery.
//!
//! All extractors locate their inputs through these helpers so that skip
//! rules stay in one place and enumeration order never leaks into findings
//! (results are sorted).

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

/// Directories never worth scanning.
const SKIP_DIRS: &[&str] = &[
    ".git",
    ".next",
    ".venv",
    "venv",
    "node_modules",
    "__pycache__",
    "dist",
    "build",
    "target",
];

fn skip_dir(name: &str) -> bool {
    SKIP_DIRS.contains(&name) || name.starts_with('.')
}

/// Walk the project and return every file matching one of the glob
/// patterns, sorted by path. Patterns are relative to the project root.
pub fn find_files(root: &Path, patterns: &[&str]) -> Vec<PathBuf> {
    let set = match build_globset(patterns) {
        Some(s) => s,
        None => return Vec::new(),
    };

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            !(e.depth() > 0
                && e.file_type().is_dir()
                && skip_dir(&e.file_name().to_string_lossy()))
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let rel = e.path().strip_prefix(root).ok()?;
            if set.is_match(rel) {
                Some(e.path().to_path_buf())
            } else {
                None
            }
        })
        .collect();

    files.sort();
    files.dedup();
    files
}

fn build_globset(patterns: &[&str]) -> Option<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for p in patterns {
        builder.add(Glob::new(p).ok()?);
    }
    builder.build().ok()
}

/// Files likely to hold backend schema declarations.
pub fn schema_files(root: &Path) -> Vec<PathBuf> {
    find_files(
        root,
        &["**/schemas.py", "**/schemas/*.py", "**/schema.py", "**/models.py"],
    )
}

/// Files likely to hold frontend interface declarations.
pub fn interface_files(root: &Path) -> Vec<PathBuf> {
    find_files(
        root,
        &[
            "**/types.ts",
            "**/types/*.ts",
            "**/types.tsx",
            "**/interfaces.ts",
            "**/interfaces/*.ts",
        ],
    )
}

/// Files likely to hold fluent validation schemas.
pub fn validator_files(root: &Path) -> Vec<PathBuf> {
    find_files(
        root,
        &[
            "**/schemas.ts",
            "**/schemas/*.ts",
            "**/forms/**/*.ts",
            "**/forms/**/*.tsx",
            "**/validation.ts",
            "**/validators.ts",
        ],
    )
}

/// Files likely to hold decorator-style route declarations.
pub fn route_files(root: &Path) -> Vec<PathBuf> {
    find_files(
        root,
        &[
            "**/api.py",
            "**/api/*.py",
            "**/routes.py",
            "**/routes/*.py",
            "**/controllers.py",
            "**/controllers/*.py",
            "**/endpoints.py",
            "**/endpoints/*.py",
            "**/views.py",
            "**/views/*.py",
        ],
    )
}

/// Handler files of the file-convention routing dialect.
pub fn convention_route_files(root: &Path) -> Vec<PathBuf> {
    find_files(root, &["**/app/**/route.ts", "**/app/**/route.tsx", "**/app/**/route.js"])
}

/// Test files of both dialects.
pub fn test_files(root: &Path) -> Vec<PathBuf> {
    find_files(
        root,
        &[
            "**/test_*.py",
            "**/*_test.py",
            "**/tests.py",
            "**/*.test.ts",
            "**/*.test.tsx",
            "**/*.spec.ts",
            "**/*.spec.tsx",
            "**/*.test.js",
            "**/*.spec.js",
        ],
    )
}

/// Dependency manifests, root plus two levels deep.
pub fn manifest_files(root: &Path) -> Vec<PathBuf> {
    find_files(
        root,
        &[
            "pyproject.toml",
            "package.json",
            "*/pyproject.toml",
            "*/package.json",
            "*/*/pyproject.toml",
            "*/*/package.json",
        ],
    )
}

/// Path rendered relative to the project root, for findings.
pub fn rel_display(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}
