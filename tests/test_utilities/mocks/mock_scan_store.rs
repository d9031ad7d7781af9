use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reposcan::prelude::*;
use reposcan::scanning::domain::ScanSession;
use uuid::Uuid;

/// ScanStore backed by InMemoryScanStore that can be told to fail one operation
#[derive(Default, Clone)]
pub struct MockScanStore {
    pub inner: InMemoryScanStore,
    fail_on: Option<&'static str>,
}

impl MockScanStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails every call to `operation` ("upsert", "create", "save", "complete", "touch")
    pub fn failing(operation: &'static str) -> Self {
        Self {
            fail_on: Some(operation),
            ..Self::default()
        }
    }

    fn check(&self, operation: &str) -> Result<()> {
        if self.fail_on == Some(operation) {
            return Err(ScanError::persistence(operation, "connection refused").into());
        }
        Ok(())
    }
}

#[async_trait]
impl ScanStore for MockScanStore {
    async fn upsert_repository(&self, repository: &RepositoryRef) -> Result<Uuid> {
        self.check("upsert")?;
        self.inner.upsert_repository(repository).await
    }

    async fn create_session(&self, session: &ScanSession) -> Result<()> {
        self.check("create")?;
        self.inner.create_session(session).await
    }

    async fn save_vulnerabilities(&self, scan_id: Uuid, vulnerabilities: &[Vulnerability]) -> Result<()> {
        self.check("save")?;
        self.inner.save_vulnerabilities(scan_id, vulnerabilities).await
    }

    async fn complete_session(&self, session: &ScanSession) -> Result<()> {
        self.check("complete")?;
        self.inner.complete_session(session).await
    }

    async fn fail_session(&self, session: &ScanSession) -> Result<()> {
        self.inner.fail_session(session).await
    }

    async fn touch_repository(&self, repository_id: Uuid, scanned_at: DateTime<Utc>) -> Result<()> {
        self.check("touch")?;
        self.inner.touch_repository(repository_id, scanned_at).await
    }
}
