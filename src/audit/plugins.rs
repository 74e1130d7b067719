//! Project-local plugin units.
//!
//! Any executable in `.stackaudit/plugins/` is a plugin: it receives the run
//! context as JSON on stdin and prints findings as a JSON array on stdout.
//! Plugins run after the built-in auditors, in alphabetical order, and are
//! failure-isolated: a plugin that cannot be run, exits nonzero, or prints
//! malformed output becomes a single info finding, never an abort.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};

use crate::audit::types::{AuditKind, Finding, Severity};
use crate::config::AuditConfig;

/// What a plugin is told about the run.
#[derive(Serialize)]
struct PluginContext<'a> {
    project_path: String,
    base_url: &'a str,
}

/// What a plugin reports back. `kind` is not accepted from plugins; every
/// plugin finding carries the plugin kind.
#[derive(Deserialize)]
struct PluginFinding {
    severity: Severity,
    #[serde(default)]
    file: String,
    #[serde(default)]
    line: usize,
    message: String,
    #[serde(default)]
    suggestion: String,
}

/// Run every plugin unit. Returns the findings and the executed plugin names
/// (`plugin:<file name>`), in order.
pub fn run_plugins(config: &AuditConfig) -> (Vec<Finding>, Vec<String>) {
    let mut findings = Vec::new();
    let mut names = Vec::new();

    for path in plugin_units(config) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "plugin".to_string());
        names.push(format!("plugin:{}", name));
        match run_one(config, &path) {
            Ok(mut plugin_findings) => findings.append(&mut plugin_findings),
            Err(message) => findings.push(Finding::new(
                AuditKind::Plugin,
                Severity::Info,
                format!(".stackaudit/plugins/{}", name),
                0,
                message,
                "Fix the plugin; its findings were skipped this run",
            )),
        }
    }

    (findings, names)
}

/// Executable files in the plugin directory, sorted by name.
fn plugin_units(config: &AuditConfig) -> Vec<PathBuf> {
    let dir = config.plugin_dir();
    let Ok(entries) = std::fs::read_dir(&dir) else {
        return Vec::new();
    };

    let mut units: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_executable(p))
        .collect();
    units.sort();
    units
}

#[cfg(unix)]
fn is_executable(path: &std::path::Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &std::path::Path) -> bool {
    true
}

fn run_one(config: &AuditConfig, path: &std::path::Path) -> Result<Vec<Finding>, String> {
    let context = PluginContext {
        project_path: config.project_path.to_string_lossy().into_owned(),
        base_url: &config.base_url,
    };
    let input =
        serde_json::to_vec(&context).map_err(|e| format!("Plugin context unserializable: {}", e))?;

    let mut child = Command::new(path)
        .current_dir(&config.project_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| format!("Plugin failed to start: {}", e))?;

    if let Some(stdin) = child.stdin.take() {
        let mut stdin = stdin;
        // A plugin may exit without reading stdin; a broken pipe is fine.
        let _ = stdin.write_all(&input);
    }

    let output = child
        .wait_with_output()
        .map_err(|e| format!("Plugin did not finish: {}", e))?;
    if !output.status.success() {
        return Err(format!("Plugin exited with {}", output.status));
    }

    let reported: Vec<PluginFinding> = serde_json::from_slice(&output.stdout)
        .map_err(|e| format!("Plugin output is not a findings array: {}", e))?;

    Ok(reported
        .into_iter()
        .map(|p| {
            Finding::new(
                AuditKind::Plugin,
                p.severity,
                p.file,
                p.line,
                p.message,
                p.suggestion,
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_for(temp: &TempDir) -> AuditConfig {
        AuditConfig::build(temp.path(), &[], None, false, None, false, false).unwrap()
    }

    #[cfg(unix)]
    fn install_plugin(temp: &TempDir, name: &str, script: &str) {
        use std::os::unix::fs::PermissionsExt;
        let dir = temp.path().join(".stackaudit/plugins");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_no_plugin_dir_is_clean() {
        let temp = TempDir::new().unwrap();
        let (findings, names) = run_plugins(&config_for(&temp));
        assert!(findings.is_empty());
        assert!(names.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_plugin_findings_are_adopted() {
        let temp = TempDir::new().unwrap();
        install_plugin(
            &temp,
            "10-check.sh",
            "#!/bin/sh\ncat > /dev/null\necho '[{\"severity\":\"warning\",\"file\":\"x.py\",\"line\":3,\"message\":\"custom rule hit\"}]'\n",
        );

        let (findings, names) = run_plugins(&config_for(&temp));
        assert_eq!(names, vec!["plugin:10-check.sh"]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, AuditKind::Plugin);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(findings[0].file, "x.py");
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_plugin_is_isolated() {
        let temp = TempDir::new().unwrap();
        install_plugin(&temp, "bad.sh", "#!/bin/sh\nexit 3\n");
        install_plugin(
            &temp,
            "good.sh",
            "#!/bin/sh\ncat > /dev/null\necho '[]'\n",
        );

        let (findings, names) = run_plugins(&config_for(&temp));
        assert_eq!(names, vec!["plugin:bad.sh", "plugin:good.sh"]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Info);
        assert!(findings[0].message.contains("exited"));
    }

    #[cfg(unix)]
    #[test]
    fn test_malformed_output_is_info() {
        let temp = TempDir::new().unwrap();
        install_plugin(&temp, "noise.sh", "#!/bin/sh\ncat > /dev/null\necho 'not json'\n");

        let (findings, _) = run_plugins(&config_for(&temp));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Info);
        assert!(findings[0].message.contains("not a findings array"));
    }

    #[cfg(unix)]
    #[test]
    fn test_plugins_run_alphabetically() {
        let temp = TempDir::new().unwrap();
        install_plugin(&temp, "b.sh", "#!/bin/sh\ncat > /dev/null\necho '[]'\n");
        install_plugin(&temp, "a.sh", "#!/bin/sh\ncat > /dev/null\necho '[]'\n");

        let (_, names) = run_plugins(&config_for(&temp));
        assert_eq!(names, vec!["plugin:a.sh", "plugin:b.sh"]);
    }
}
