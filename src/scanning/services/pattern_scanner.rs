use crate::scanning::domain::CodeFinding;
use crate::scanning::rules::code_rules::{RuleFamily, COMPILED_CODE_RULES};

/// Extensions worth scanning: scripts, markup, config, shell and server languages
const SCANNED_EXTENSIONS: &[&str] = &[
    "js", "jsx", "mjs", "cjs", "ts", "tsx", "vue", "svelte", "html", "htm", "ejs", "hbs", "php",
    "py", "rb", "java", "kt", "go", "cs", "rs", "sh", "bash", "zsh", "yml", "yaml", "xml", "ini",
    "conf",
];

/// Directories holding vendored or generated code
const SKIPPED_DIRECTORIES: &[&str] = &["node_modules/", "vendor/", "dist/", "build/", ".git/"];

/// Limits applied by the scanner
#[derive(Debug, Clone, Copy)]
pub struct PatternScanLimits {
    /// Files above this size are skipped entirely
    pub max_file_size_bytes: u64,
    /// Snippet length cap, in characters
    pub snippet_max_len: usize,
}

/// Whether `path` has an allow-listed extension and is outside vendored directories
pub fn is_scannable(path: &str) -> bool {
    let lower = path.to_lowercase();
    if lower.ends_with(".min.js")
        || SKIPPED_DIRECTORIES
            .iter()
            .any(|dir| lower.starts_with(dir) || lower.contains(&format!("/{}", dir)))
    {
        return false;
    }
    let file_name = lower.rsplit('/').next().unwrap_or(&lower);
    file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| SCANNED_EXTENSIONS.contains(&ext))
}

/// Scans one file.
///
/// Each line is evaluated with a window of (previous, current, next) lines.
/// A line reports at most one finding per rule family. Content above the size
/// ceiling yields no findings.
pub fn scan_file(path: &str, content: &str, limits: PatternScanLimits) -> Vec<CodeFinding> {
    if content.len() as u64 > limits.max_file_size_bytes {
        tracing::debug!(path = %path, size = content.len(), "Skipping file above size ceiling");
        return Vec::new();
    }

    let lines: Vec<&str> = content.lines().collect();
    let mut findings = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let start = idx.saturating_sub(1);
        let end = (idx + 2).min(lines.len());
        let window = lines[start..end].join("\n");

        let mut fired: Vec<RuleFamily> = Vec::new();
        for rule in COMPILED_CODE_RULES.iter() {
            if fired.contains(&rule.def.family) || !rule.matches(line, &window) {
                continue;
            }
            fired.push(rule.def.family);
            findings.push(CodeFinding {
                rule_id: rule.def.id.to_string(),
                title: rule.def.title.to_string(),
                description: rule.def.description.to_string(),
                severity: rule.def.severity,
                file_path: path.to_string(),
                line: idx + 1,
                snippet: truncate_chars(window.trim(), limits.snippet_max_len),
                references: rule.def.references.iter().map(|r| r.to_string()).collect(),
            });
        }
    }

    findings
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
