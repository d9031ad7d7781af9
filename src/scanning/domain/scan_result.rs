use super::severity::SeverityCounts;
use super::vulnerability::Vulnerability;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Names recorded in [`ScanResult::degraded_sources`]
pub mod detection_source {
    pub const MANIFESTS: &str = "manifests";
    pub const VULNERABILITY_DATABASE: &str = "vulnerability-database";
    pub const SOURCE_TREE: &str = "source-tree";
    pub const SOURCE_FILES: &str = "source-files";
    pub const CONFIG_FILES: &str = "config-files";
}

/// Transient aggregate returned to the caller once a scan completes
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub scan_id: Uuid,
    pub repository_id: Uuid,
    pub security_score: u8,
    pub severity_counts: SeverityCounts,
    pub vulnerabilities: Vec<Vulnerability>,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
    /// Detection sources that degraded during this scan (empty on a clean run)
    pub degraded_sources: Vec<String>,
}

impl ScanResult {
    pub fn total_vulnerabilities(&self) -> usize {
        self.severity_counts.total()
    }

    pub fn is_degraded(&self) -> bool {
        !self.degraded_sources.is_empty()
    }
}
