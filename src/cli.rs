use clap::Parser;
use std::path::PathBuf;

use crate::application::dto::OutputFormat;
use crate::logging::LogFormat;
use crate::scanning::domain::{ScanType, Severity};

/// Scan a GitHub repository for vulnerable dependencies, risky code patterns
/// and configuration mistakes
#[derive(Parser, Debug)]
#[command(name = "reposcan")]
#[command(version)]
#[command(
    about = "Scan a GitHub repository for security weaknesses and compute a security score",
    long_about = None
)]
pub struct Args {
    /// Repository URL (https://github.com/<owner>/<repo>)
    pub repo_url: String,

    /// Branch to scan (defaults to the branch in the URL, then "main")
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Scan type: full, dependencies or quick
    #[arg(short = 't', long, default_value = "full")]
    pub scan_type: ScanType,

    /// GitHub access token (unauthenticated when absent)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Path to a configuration file (defaults to ./reposcan.config.yml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: json or markdown
    #[arg(short, long, default_value = "json")]
    pub format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Exit with code 1 when a finding at or above this severity is reported
    #[arg(long, value_name = "SEVERITY")]
    pub fail_on: Option<Severity>,

    /// Diagnostic log format: pretty or json
    #[arg(long)]
    pub log_format: Option<LogFormat>,

    /// Diagnostic log level or filter directive (overridden by RUST_LOG)
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
