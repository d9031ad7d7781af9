use crate::scanning::domain::{RepositoryRef, ScanType};
use crate::shared::Result;
use serde::Deserialize;

/// ScanRequest - request DTO of the scan use case
///
/// Mirrors the trigger payload of the surrounding service:
/// `{repoUrl, branch?, scanType}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub repo_url: String,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub scan_type: ScanType,
}

impl ScanRequest {
    pub fn new(repo_url: impl Into<String>, branch: Option<String>, scan_type: ScanType) -> Self {
        Self {
            repo_url: repo_url.into(),
            branch,
            scan_type,
        }
    }

    /// Resolves the target repository.
    ///
    /// # Errors
    /// `ScanError::InvalidInput` when the URL or branch does not parse
    pub fn validate(&self) -> Result<RepositoryRef> {
        RepositoryRef::parse(&self.repo_url, self.branch.as_deref())
    }
}
