use crate::scanning::domain::ScanResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// ScanResponse - response DTO handed back to the surrounding service
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub success: bool,
    pub scan_id: Uuid,
    pub security_score: u8,
    pub total_vulnerabilities: usize,
    pub critical_count: usize,
    pub high_count: usize,
    pub medium_count: usize,
    pub low_count: usize,
    /// Milliseconds
    pub scan_duration: u64,
    pub scan_timestamp: DateTime<Utc>,
}

impl From<&ScanResult> for ScanResponse {
    fn from(result: &ScanResult) -> Self {
        let counts = result.severity_counts;
        Self {
            // Degraded scans still succeed
            success: true,
            scan_id: result.scan_id,
            security_score: result.security_score,
            total_vulnerabilities: counts.total(),
            critical_count: counts.critical,
            high_count: counts.high,
            medium_count: counts.medium,
            low_count: counts.low,
            scan_duration: result.duration_ms,
            scan_timestamp: result.timestamp,
        }
    }
}
