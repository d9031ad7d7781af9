use async_trait::async_trait;
use reposcan::ports::outbound::BatchResponse;
use reposcan::prelude::*;
use reposcan::scanning::domain::{
    AffectedPackage, PackageQuery, RawVulnerabilityRecord, SeverityDescriptor,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Mock VulnerabilityDatabase keyed by package name
#[derive(Default, Clone)]
pub struct MockVulnerabilityDatabase {
    advisories: HashMap<String, Vec<RawVulnerabilityRecord>>,
    pub queried: Arc<Mutex<Vec<String>>>,
}

impl MockVulnerabilityDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an advisory with a numeric CVSS score and a fixed version
    pub fn with_advisory(mut self, package: &str, id: &str, cvss: &str, fixed: &str) -> Self {
        let mut record = RawVulnerabilityRecord::new(id);
        record.summary = Some(format!("{} in {}", id, package));
        record.severity = vec![SeverityDescriptor {
            kind: "CVSS_V3".to_string(),
            score: cvss.to_string(),
        }];
        record.affected = vec![AffectedPackage {
            name: Some(package.to_string()),
            ecosystem: None,
            fixed_versions: vec![fixed.to_string()],
        }];
        self.advisories
            .entry(package.to_string())
            .or_default()
            .push(record);
        self
    }
}

#[async_trait]
impl VulnerabilityDatabase for MockVulnerabilityDatabase {
    async fn query_batch(&self, queries: &[PackageQuery]) -> Result<BatchResponse> {
        self.queried
            .lock()
            .unwrap()
            .extend(queries.iter().map(|q| q.name().to_string()));
        Ok(BatchResponse {
            results: queries
                .iter()
                .map(|q| self.advisories.get(q.name()).cloned().unwrap_or_default())
                .collect(),
            failed_chunks: 0,
        })
    }
}
