//! Command-line interface for stackaudit.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::audit;
use crate::config::{AuditConfig, CONFIG_FILE};
use crate::html;
use crate::report;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Cross-language monorepo drift auditor.
///
/// Stackaudit scans a backend/frontend repository for contract drift:
/// schemas whose fields disagree across the language boundary, routes that
/// are duplicated, stubbed, or unprotected, untested feature areas, and
/// dependency hygiene problems.
#[derive(Parser)]
#[command(name = "stackaudit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Audit a project tree and report findings
    #[command(visible_alias = "check")]
    Audit(AuditArgs),
    /// Create a starter .stackaudit.yaml and plugin directory
    Init(InitArgs),
}

/// Arguments for the audit command.
#[derive(Parser)]
pub struct AuditArgs {
    /// Project root to audit
    pub path: PathBuf,

    /// Audit types to run (default: all)
    #[arg(short, long, value_delimiter = ',')]
    pub audits: Vec<String>,

    /// Minimum severity to report: error, warning, or info
    #[arg(short = 's', long)]
    pub min_severity: Option<String>,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Probe declared GET routes against a running server
    #[arg(long)]
    pub live: bool,

    /// Base URL for the live probe
    #[arg(long)]
    pub base_url: Option<String>,

    /// Blank leftover debug statements in place
    #[arg(long)]
    pub fix: bool,

    /// Maintain the audit block in the project's todo notes
    #[arg(long)]
    pub write_notes: bool,

    /// Also write a self-contained HTML dashboard to this path
    #[arg(long)]
    pub html: Option<PathBuf>,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Project root to initialize
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

const STARTER_CONFIG: &str = r#"# stackaudit project configuration.
# Every key is optional; delete what you do not need.

# Feature-area vocabulary for test-coverage classification.
# Replacing this map replaces the built-in areas entirely.
#areas:
#  auth: [auth, login, register, signup, token, password]
#  billing: [invoice, payment, refund]

# Deprecated-package denylist, package -> replacement advice.
#deprecated:
#  moment: Use date-fns or dayjs instead

# Areas with fewer test cases than this get a suggested-test finding.
#sparse_test_threshold: 2
"#;

/// Run the audit command.
pub fn run_audit(args: &AuditArgs) -> anyhow::Result<i32> {
    if args.format != "pretty" && args.format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    let config = match AuditConfig::build(
        &args.path,
        &args.audits,
        args.min_severity.as_deref(),
        args.live,
        args.base_url.as_deref(),
        args.fix,
        args.write_notes,
    ) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let outcome = audit::run_audits(&config);

    let path_str = args.path.to_string_lossy().to_string();
    match args.format.as_str() {
        "json" => report::write_json(&path_str, &outcome)?,
        _ => report::write_pretty(&path_str, &outcome),
    }

    if let Some(out) = &args.html {
        html::write_dashboard(out, &path_str, &outcome)?;
        eprintln!("Dashboard written to {}", out.display());
    }

    if config.write_notes {
        report::inject_notes(&config.project_path, &outcome.findings)?;
    }

    if outcome.has_errors() {
        Ok(EXIT_FAILED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    if !args.path.is_dir() {
        eprintln!("Error: not a directory: {}", args.path.display());
        return Ok(EXIT_ERROR);
    }

    let config_path = args.path.join(CONFIG_FILE);
    if config_path.exists() {
        eprintln!("Error: file already exists: {}", config_path.display());
        return Ok(EXIT_ERROR);
    }

    std::fs::write(&config_path, STARTER_CONFIG)?;
    std::fs::create_dir_all(args.path.join(".stackaudit").join("plugins"))?;

    println!("Created {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to customize vocabulary and denylists", CONFIG_FILE);
    println!("  2. Drop executable plugin units into .stackaudit/plugins/");
    println!("  3. Run: stackaudit audit {}", args.path.display());

    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_invalid_format_is_usage_error() {
        let temp = TempDir::new().unwrap();
        let args = AuditArgs {
            path: temp.path().to_path_buf(),
            audits: vec![],
            min_severity: None,
            format: "xml".to_string(),
            live: false,
            base_url: None,
            fix: false,
            write_notes: false,
            html: None,
        };
        assert_eq!(run_audit(&args).unwrap(), EXIT_ERROR);
    }

    #[test]
    fn test_missing_path_is_usage_error() {
        let args = AuditArgs {
            path: PathBuf::from("/nonexistent/project"),
            audits: vec![],
            min_severity: None,
            format: "pretty".to_string(),
            live: false,
            base_url: None,
            fix: false,
            write_notes: false,
            html: None,
        };
        assert_eq!(run_audit(&args).unwrap(), EXIT_ERROR);
    }

    #[test]
    fn test_clean_project_exits_zero() {
        let temp = TempDir::new().unwrap();
        let args = AuditArgs {
            path: temp.path().to_path_buf(),
            audits: vec!["quality".to_string()],
            min_severity: None,
            format: "pretty".to_string(),
            live: false,
            base_url: None,
            fix: false,
            write_notes: false,
            html: None,
        };
        assert_eq!(run_audit(&args).unwrap(), EXIT_SUCCESS);
    }

    #[test]
    fn test_errors_exit_one() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("api.py"),
            "@router.delete(\"/users/<int:pk>\")\ndef delete_user(request, pk):\n    return destroy(pk)\n",
        )
        .unwrap();
        let args = AuditArgs {
            path: temp.path().to_path_buf(),
            audits: vec!["endpoints".to_string()],
            min_severity: None,
            format: "pretty".to_string(),
            live: false,
            base_url: None,
            fix: false,
            write_notes: false,
            html: None,
        };
        assert_eq!(run_audit(&args).unwrap(), EXIT_FAILED);
    }

    #[test]
    fn test_init_creates_config_once() {
        let temp = TempDir::new().unwrap();
        let args = InitArgs {
            path: temp.path().to_path_buf(),
        };
        assert_eq!(run_init(&args).unwrap(), EXIT_SUCCESS);
        assert!(temp.path().join(CONFIG_FILE).is_file());
        assert!(temp.path().join(".stackaudit/plugins").is_dir());
        assert_eq!(run_init(&args).unwrap(), EXIT_ERROR);
    }
}
