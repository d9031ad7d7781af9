use crate::scanning::domain::{PackageQuery, RawVulnerabilityRecord};
use crate::shared::Result;
use async_trait::async_trait;

/// Result of one batched lookup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResponse {
    /// One result set per query, positionally aligned with the request
    pub results: Vec<Vec<RawVulnerabilityRecord>>,
    /// Request chunks that failed and were degraded to empty result sets
    pub failed_chunks: usize,
}

impl BatchResponse {
    pub fn total_records(&self) -> usize {
        self.results.iter().map(Vec::len).sum()
    }
}

/// VulnerabilityDatabase port for known-vulnerability lookups
#[async_trait]
pub trait VulnerabilityDatabase: Send + Sync {
    /// Looks up every query in as few requests as the service allows.
    ///
    /// Unpinned queries are not sent and get an empty result set. An empty
    /// query list performs no request. Implementations bound each request
    /// they make; the batch as a whole has no deadline.
    ///
    /// # Errors
    /// Returns an error when no chunk of the batch could be answered
    async fn query_batch(&self, queries: &[PackageQuery]) -> Result<BatchResponse>;
}
