//! Engine configuration for reposcan.
//!
//! Settings are layered: built-in defaults, then an optional
//! `reposcan.config.yml`, then command-line flags and the `GITHUB_TOKEN`
//! environment variable. The result is one explicit `EngineConfig` handed to
//! every adapter constructor.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::adapters::outbound::network::{GitHubSourceHost, OsvClient};
use crate::application::use_cases::ScanSettings;
use crate::logging::LogFormat;
use crate::scanning::domain::Severity;
use crate::scanning::services::PatternScanLimits;
use crate::shared::error::ScanError;
use crate::shared::Result;

pub const CONFIG_FILENAME: &str = "reposcan.config.yml";

/// Configuration file schema. Every key is optional.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub osv_api_url: Option<String>,
    pub github_api_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub max_concurrency: Option<usize>,
    pub max_file_size_bytes: Option<u64>,
    pub max_source_files: Option<usize>,
    pub snippet_max_len: Option<usize>,
    pub dedupe_findings: Option<bool>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub fail_on: Option<String>,
    /// Captures unknown fields for warnings.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

/// Values supplied on the command line; they win over the file
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub github_token: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub fail_on: Option<Severity>,
}

/// Fully resolved configuration of one engine run
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub osv_api_url: String,
    pub github_api_url: String,
    pub github_token: Option<String>,
    pub request_timeout: Duration,
    pub max_concurrency: usize,
    pub max_file_size_bytes: u64,
    pub max_source_files: usize,
    pub snippet_max_len: usize,
    pub dedupe_findings: bool,
    pub log_level: String,
    pub log_format: LogFormat,
    /// Lowest severity that makes the CLI exit with code 1
    pub fail_on: Option<Severity>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            osv_api_url: OsvClient::DEFAULT_API_URL.to_string(),
            github_api_url: GitHubSourceHost::DEFAULT_API_URL.to_string(),
            github_token: None,
            request_timeout: Duration::from_secs(30),
            max_concurrency: 8,
            max_file_size_bytes: 500 * 1024,
            max_source_files: 200,
            snippet_max_len: 200,
            dedupe_findings: false,
            log_level: "warn".to_string(),
            log_format: LogFormat::Pretty,
            fail_on: None,
        }
    }
}

impl EngineConfig {
    /// Builds the configuration from defaults, an optional file and overrides
    ///
    /// An explicit `config_path` must exist. Without one, `reposcan.config.yml`
    /// is picked up from `search_dir` when present.
    pub fn load(config_path: Option<&Path>, search_dir: &Path, overrides: ConfigOverrides) -> Result<Self> {
        let file = match config_path {
            Some(path) => Some(load_config_from_path(path)?),
            None => discover_config(search_dir)?,
        };

        let mut config = Self::default();
        if let Some(file) = file {
            config.apply_file(file)?;
        }
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    fn apply_file(&mut self, file: ConfigFile) -> Result<()> {
        if let Some(url) = file.osv_api_url {
            self.osv_api_url = url;
        }
        if let Some(url) = file.github_api_url {
            self.github_api_url = url;
        }
        if let Some(secs) = file.request_timeout_secs {
            self.request_timeout = Duration::from_secs(secs);
        }
        if let Some(n) = file.max_concurrency {
            self.max_concurrency = n;
        }
        if let Some(n) = file.max_file_size_bytes {
            self.max_file_size_bytes = n;
        }
        if let Some(n) = file.max_source_files {
            self.max_source_files = n;
        }
        if let Some(n) = file.snippet_max_len {
            self.snippet_max_len = n;
        }
        if let Some(dedupe) = file.dedupe_findings {
            self.dedupe_findings = dedupe;
        }
        if let Some(level) = file.log_level {
            self.log_level = level;
        }
        if let Some(format) = file.log_format {
            self.log_format = format
                .parse()
                .map_err(|message: String| ScanError::Config { message })?;
        }
        if let Some(severity) = file.fail_on {
            let severity: Severity = severity
                .parse()
                .map_err(|message: String| ScanError::Config { message })?;
            self.fail_on = Some(severity);
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(token) = overrides.github_token.filter(|t| !t.trim().is_empty()) {
            self.github_token = Some(token);
        }
        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
        if let Some(format) = overrides.log_format {
            self.log_format = format;
        }
        if overrides.fail_on.is_some() {
            self.fail_on = overrides.fail_on;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.request_timeout.is_zero() {
            return Err(ScanError::Config {
                message: "request_timeout_secs must be greater than 0".to_string(),
            }
            .into());
        }
        if self.max_concurrency == 0 {
            return Err(ScanError::Config {
                message: "max_concurrency must be greater than 0".to_string(),
            }
            .into());
        }
        for (key, url) in [("osv_api_url", &self.osv_api_url), ("github_api_url", &self.github_api_url)] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ScanError::Config {
                    message: format!("{} must be an http(s) URL, got '{}'", key, url),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Runtime knobs handed to the scan use cases
    pub fn scan_settings(&self) -> ScanSettings {
        ScanSettings {
            request_timeout: self.request_timeout,
            max_concurrency: self.max_concurrency,
            max_source_files: self.max_source_files,
            pattern_limits: PatternScanLimits {
                max_file_size_bytes: self.max_file_size_bytes,
                snippet_max_len: self.snippet_max_len,
            },
            dedupe_findings: self.dedupe_findings,
        }
    }
}

/// Load config from an explicit path. Returns an error if the file is not found.
pub fn load_config_from_path(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path).map_err(|e| ScanError::Config {
        message: format!("Failed to read config file {}: {}", path.display(), e),
    })?;

    let config: ConfigFile = serde_yaml_ng::from_str(&content).map_err(|e| ScanError::Config {
        message: format!("Failed to parse config file {}: {}", path.display(), e),
    })?;

    warn_unknown_fields(&config);
    Ok(config)
}

/// Auto-discover config in a directory. Returns `None` silently if not found.
pub fn discover_config(dir: &Path) -> Result<Option<ConfigFile>> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    load_config_from_path(&config_path).map(Some)
}

fn warn_unknown_fields(config: &ConfigFile) {
    for key in config.unknown_fields.keys() {
        tracing::warn!(field = %key, "Unknown config field will be ignored");
    }
}
