use super::severity::Severity;
use serde::Serialize;

/// A static pattern scanner hit on one line of a source file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeFinding {
    pub rule_id: String,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub file_path: String,
    /// 1-based line number of the triggering line
    pub line: usize,
    pub snippet: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
}

/// A configuration auditor hit on a well-known configuration file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFinding {
    pub rule_id: String,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub file_path: String,
    pub line: Option<usize>,
    pub evidence: Option<String>,
}
