//! Fixed misconfiguration checks for well-known configuration files

use crate::scanning::domain::Severity;
use regex::Regex;
use std::sync::LazyLock;

use self::ConfigTarget::{Compose, EnvFile, Production, ReverseProxy};

/// Configuration file shapes the auditor understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigTarget {
    /// `config/production.*`, `application-prod*.yml`, `settings/production.py`
    Production,
    /// `docker-compose.yml`, `compose.yaml`
    Compose,
    /// `nginx.conf`, `nginx/**/*.conf`, `sites-enabled/*`
    ReverseProxy,
    /// `.env`, `.env.production`
    EnvFile,
}

impl ConfigTarget {
    /// Well-known locations probed when no file tree is available
    pub const WELL_KNOWN_PATHS: [&'static str; 11] = [
        ".env",
        ".env.production",
        "docker-compose.yml",
        "docker-compose.yaml",
        "compose.yml",
        "compose.yaml",
        "nginx.conf",
        "config/production.json",
        "config/production.js",
        "config/production.yml",
        "config/production.yaml",
    ];

    /// Classifies a repository path, `None` for anything the auditor ignores
    pub fn classify(path: &str) -> Option<Self> {
        let lower = path.to_lowercase();
        let file_name = lower.rsplit('/').next().unwrap_or(&lower);

        if file_name == ".env" || file_name.starts_with(".env.") {
            let sample = [".example", ".sample", ".template", ".dist"]
                .iter()
                .any(|suffix| file_name.ends_with(suffix));
            return (!sample).then_some(ConfigTarget::EnvFile);
        }
        if matches!(
            file_name,
            "docker-compose.yml" | "docker-compose.yaml" | "compose.yml" | "compose.yaml"
        ) || (file_name.starts_with("docker-compose.")
            && (file_name.ends_with(".yml") || file_name.ends_with(".yaml")))
        {
            return Some(ConfigTarget::Compose);
        }
        if file_name == "nginx.conf"
            || ((lower.contains("nginx/") || lower.contains("sites-enabled/"))
                && (file_name.ends_with(".conf") || !file_name.contains('.')))
        {
            return Some(ConfigTarget::ReverseProxy);
        }
        let (stem, extension) = file_name.rsplit_once('.').unwrap_or((file_name, ""));
        let config_extension = matches!(
            extension,
            "json" | "js" | "cjs" | "yml" | "yaml" | "toml" | "ini" | "py" | "properties"
        );
        if config_extension && (stem == "production" || stem.starts_with("application-prod")) {
            return Some(ConfigTarget::Production);
        }
        None
    }
}

/// How a rule decides it fired
pub enum ConfigPredicate {
    /// Every line matching the pattern is a hit
    Line(&'static str),
    /// File-level: `present` matches some line and `absent` matches none
    LineWithout {
        present: &'static str,
        absent: &'static str,
    },
}

pub struct ConfigRuleDef {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub severity: Severity,
    pub targets: &'static [ConfigTarget],
    pub predicate: ConfigPredicate,
    /// Evidence lines would leak a secret
    pub redact_evidence: bool,
}

pub const CONFIG_RULES: &[ConfigRuleDef] = &[
    ConfigRuleDef {
        id: "cors-wildcard-origin",
        title: "Permissive cross-origin policy",
        description: "Any origin may issue credentialed cross-origin requests",
        severity: Severity::High,
        targets: &[Production, ReverseProxy, EnvFile],
        predicate: ConfigPredicate::Line(
            r#"(?i)(?:access-control-allow-origin["']?\s*[:=]?\s*["']?\*|\borigin["']?\s*[:=]\s*["']\*["']|\bcors_(?:allowed_)?origins?\s*=\s*["']?\*)"#,
        ),
        redact_evidence: false,
    },
    ConfigRuleDef {
        id: "hardcoded-db-credential",
        title: "Hardcoded datastore credential",
        description: "A datastore password is committed in plain text",
        severity: Severity::Critical,
        targets: &[Production, Compose, EnvFile],
        predicate: ConfigPredicate::Line(
            r#"(?i)\b(?:db|database|postgres|mysql|mysql_root|mariadb|mongo|mongo_initdb_root|redis)[_-]?pass(?:word|wd)?["']?\s*[:=]\s*["']?[^\s"'$]"#,
        ),
        redact_evidence: true,
    },
    ConfigRuleDef {
        id: "debug-enabled",
        title: "Debug mode enabled",
        description: "Debug output exposes stack traces and internals",
        severity: Severity::Medium,
        targets: &[Production, Compose, EnvFile],
        predicate: ConfigPredicate::Line(
            r#"(?i)\b(?:app_|flask_|django_)?debug["']?\s*[:=]\s*["']?(?:true|1|on|yes)\b"#,
        ),
        redact_evidence: false,
    },
    ConfigRuleDef {
        id: "plaintext-listener",
        title: "Plaintext transport without TLS",
        description: "The proxy listens on port 80 and never enables TLS or redirects to HTTPS",
        severity: Severity::High,
        targets: &[ReverseProxy],
        predicate: ConfigPredicate::LineWithout {
            present: r"^\s*listen\s+(?:\S*:)?80\b",
            absent: r"(?i)\bssl\b|return\s+30[18]\s+https://",
        },
        redact_evidence: false,
    },
    ConfigRuleDef {
        id: "tls-disabled",
        title: "Plaintext transport without TLS",
        description: "TLS is explicitly disabled for an outbound connection",
        severity: Severity::High,
        targets: &[Production, Compose, EnvFile],
        predicate: ConfigPredicate::Line(
            r#"(?i)(?:^|[_\W])(?:ssl|tls|use_ssl|use_tls|secure|sslmode)["']?\s*[:=]\s*["']?(?:false|disable|disabled|off|0)\b"#,
        ),
        redact_evidence: false,
    },
    ConfigRuleDef {
        id: "credentials-in-connection-string",
        title: "Connection string embeds credentials",
        description: "A connection URL carries a username and password",
        severity: Severity::Critical,
        targets: &[Production, Compose, ReverseProxy, EnvFile],
        predicate: ConfigPredicate::Line(
            r#"\b[a-zA-Z][a-zA-Z0-9+.-]*://[^\s:/@"'$]+:[^\s@/"'$]+@[^\s"']+"#,
        ),
        redact_evidence: true,
    },
];

pub enum CompiledPredicate {
    Line(Regex),
    LineWithout { present: Regex, absent: Regex },
}

pub struct CompiledConfigRule {
    pub def: &'static ConfigRuleDef,
    pub predicate: CompiledPredicate,
}

fn compile(def: &'static ConfigRuleDef) -> Result<CompiledConfigRule, regex::Error> {
    let predicate = match &def.predicate {
        ConfigPredicate::Line(pattern) => CompiledPredicate::Line(Regex::new(pattern)?),
        ConfigPredicate::LineWithout { present, absent } => CompiledPredicate::LineWithout {
            present: Regex::new(present)?,
            absent: Regex::new(absent)?,
        },
    };
    Ok(CompiledConfigRule { def, predicate })
}

pub static COMPILED_CONFIG_RULES: LazyLock<Vec<CompiledConfigRule>> = LazyLock::new(|| {
    CONFIG_RULES
        .iter()
        .filter_map(|def| match compile(def) {
            Ok(rule) => Some(rule),
            Err(e) => {
                tracing::warn!(rule_id = %def.id, error = %e, "Failed to compile config rule pattern");
                None
            }
        })
        .collect()
});
