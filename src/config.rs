//! Audit configuration.
//!
//! `AuditConfig` is built once per invocation, validated up front, and passed
//! by reference into every auditor constructor. Invalid configuration is the
//! only fatal error class: it fails the invocation before any scanning.
//!
//! A project may carry an optional `.stackaudit.yaml` overriding the
//! feature-area vocabulary, the deprecated-package denylist, and thresholds.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::audit::types::{AuditKind, Severity};
use crate::extract::tests::{default_vocabulary, AreaVocabulary};

/// Project config file name.
pub const CONFIG_FILE: &str = ".stackaudit.yaml";

/// Configuration failures. Every variant aborts the invocation with a clear
/// message before any scanning begins.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("unknown audit type {0:?} (valid: types, endpoints, tests, dependencies, vulnerabilities, quality)")]
    UnknownAuditType(String),
    #[error("unknown severity {0:?} (valid: error, warning, info)")]
    UnknownSeverity(String),
    #[error("--live requires a base URL starting with http:// or https://, got {0:?}")]
    InvalidBaseUrl(String),
    #[error("cannot read {file}: {source}")]
    Unreadable {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid {file}: {message}")]
    InvalidConfigFile { file: PathBuf, message: String },
}

/// Default denylist of deprecated packages, name -> replacement advice.
fn default_deprecated() -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    let mut add = |name: &str, advice: &str| {
        map.insert(name.to_string(), advice.to_string());
    };
    add("nose", "Use pytest instead");
    add("mock", "Use unittest.mock (stdlib) instead");
    add("six", "Python 2 compatibility layer, drop if Python 3 only");
    add("future", "Python 2 compatibility layer, drop if Python 3 only");
    add("moment", "Use date-fns or dayjs instead");
    add("request", "Use fetch (built-in) or axios instead");
    add("tslint", "Use eslint with typescript-eslint instead");
    map
}

/// Shape of `.stackaudit.yaml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    areas: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default)]
    deprecated: Option<BTreeMap<String, String>>,
    #[serde(default)]
    sparse_test_threshold: Option<usize>,
}

/// Process-scoped audit configuration. Read-only after construction.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub project_path: PathBuf,
    /// Selected audit kinds, already validated. Empty selection on the CLI
    /// expands to all selectable kinds.
    pub kinds: Vec<AuditKind>,
    pub min_severity: Severity,
    pub live: bool,
    pub base_url: String,
    pub fix: bool,
    pub write_notes: bool,
    /// Feature-area vocabulary for test/coverage classification.
    pub areas: AreaVocabulary,
    /// Deprecated-package denylist, name -> advice.
    pub deprecated: BTreeMap<String, String>,
    /// Areas with fewer tests than this are suggested as test stories.
    pub sparse_test_threshold: usize,
}

impl AuditConfig {
    /// Build and validate a configuration. `kinds`/`min_severity` arrive as
    /// raw CLI strings so every validation failure surfaces here.
    pub fn build(
        project_path: &Path,
        kind_names: &[String],
        min_severity: Option<&str>,
        live: bool,
        base_url: Option<&str>,
        fix: bool,
        write_notes: bool,
    ) -> Result<Self, ConfigError> {
        if !project_path.is_dir() {
            return Err(ConfigError::NotADirectory(project_path.to_path_buf()));
        }

        let kinds = if kind_names.is_empty() {
            AuditKind::SELECTABLE.to_vec()
        } else {
            let mut kinds = Vec::new();
            for name in kind_names {
                let kind: AuditKind = name
                    .parse()
                    .map_err(|_| ConfigError::UnknownAuditType(name.clone()))?;
                if !kinds.contains(&kind) {
                    kinds.push(kind);
                }
            }
            kinds
        };

        let min_severity = match min_severity {
            Some(s) => s
                .parse()
                .map_err(|_| ConfigError::UnknownSeverity(s.to_string()))?,
            None => Severity::Info,
        };

        let base_url = base_url.unwrap_or("http://localhost:8000").to_string();
        if live && !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(base_url));
        }

        let file_config = load_file_config(project_path)?;

        Ok(Self {
            project_path: project_path.to_path_buf(),
            kinds,
            min_severity,
            live,
            base_url: base_url.trim_end_matches('/').to_string(),
            fix,
            write_notes,
            areas: file_config.areas.unwrap_or_else(default_vocabulary),
            deprecated: file_config.deprecated.unwrap_or_else(default_deprecated),
            sparse_test_threshold: file_config.sparse_test_threshold.unwrap_or(2),
        })
    }

    pub fn should_run(&self, kind: AuditKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Plugin unit directory for this project.
    pub fn plugin_dir(&self) -> PathBuf {
        self.project_path.join(".stackaudit").join("plugins")
    }
}

fn load_file_config(project_path: &Path) -> Result<FileConfig, ConfigError> {
    let path = project_path.join(CONFIG_FILE);
    if !path.is_file() {
        return Ok(FileConfig::default());
    }
    let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Unreadable {
        file: path.clone(),
        source,
    })?;
    serde_yaml::from_str(&text).map_err(|e| ConfigError::InvalidConfigFile {
        file: path,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn build(temp: &TempDir, kinds: &[&str], severity: Option<&str>) -> Result<AuditConfig, ConfigError> {
        let kind_names: Vec<String> = kinds.iter().map(|s| s.to_string()).collect();
        AuditConfig::build(temp.path(), &kind_names, severity, false, None, false, true)
    }

    #[test]
    fn test_defaults() {
        let temp = TempDir::new().unwrap();
        let config = build(&temp, &[], None).unwrap();
        assert_eq!(config.kinds.len(), AuditKind::SELECTABLE.len());
        assert_eq!(config.min_severity, Severity::Info);
        assert!(config.areas.contains_key("auth"));
        assert!(config.deprecated.contains_key("moment"));
    }

    #[test]
    fn test_unknown_kind_is_fatal() {
        let temp = TempDir::new().unwrap();
        let err = build(&temp, &["typos"], None).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownAuditType(_)));
    }

    #[test]
    fn test_unknown_severity_is_fatal() {
        let temp = TempDir::new().unwrap();
        let err = build(&temp, &[], Some("fatal")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownSeverity(_)));
    }

    #[test]
    fn test_missing_project_path_is_fatal() {
        let err = AuditConfig::build(
            Path::new("/nonexistent/project"),
            &[],
            None,
            false,
            None,
            false,
            true,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::NotADirectory(_)));
    }

    #[test]
    fn test_live_requires_http_url() {
        let temp = TempDir::new().unwrap();
        let err = AuditConfig::build(
            temp.path(),
            &[],
            None,
            true,
            Some("localhost:8000"),
            false,
            true,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl(_)));
    }

    #[test]
    fn test_file_config_overrides_vocabulary() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE),
            "areas:\n  billing:\n    - invoice\n    - payment\nsparse_test_threshold: 5\n",
        )
        .unwrap();
        let config = build(&temp, &[], None).unwrap();
        assert_eq!(config.areas.len(), 1);
        assert!(config.areas.contains_key("billing"));
        assert_eq!(config.sparse_test_threshold, 5);
    }

    #[test]
    fn test_invalid_file_config_is_fatal() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE), "areas: [not, a, map]\n").unwrap();
        let err = build(&temp, &[], None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfigFile { .. }));
    }
}
