//! Scan report read model
//!
//! Denormalized view of a finished scan, shaped for the report formatters.

use crate::application::dto::ScanResponse;
use crate::scanning::domain::{RepositoryRef, ScanResult, ScanType, Vulnerability};
use serde::Serialize;

/// Everything a formatter needs to render one scan
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    #[serde(flatten)]
    pub summary: ScanResponse,
    pub repository: RepositoryView,
    pub scan_type: ScanType,
    pub degraded_sources: Vec<String>,
    pub vulnerabilities: Vec<Vulnerability>,
}

/// View of the scanned repository
#[derive(Debug, Clone, Serialize)]
pub struct RepositoryView {
    pub url: String,
    pub owner: String,
    pub name: String,
    pub branch: String,
}

impl ScanReport {
    pub fn new(repository: &RepositoryRef, scan_type: ScanType, result: &ScanResult) -> Self {
        Self {
            summary: ScanResponse::from(result),
            repository: RepositoryView {
                url: repository.url(),
                owner: repository.owner().to_string(),
                name: repository.name().to_string(),
                branch: repository.branch().to_string(),
            },
            scan_type,
            degraded_sources: result.degraded_sources.clone(),
            vulnerabilities: result.vulnerabilities.clone(),
        }
    }
}
