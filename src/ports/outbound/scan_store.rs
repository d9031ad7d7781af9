use crate::scanning::domain::{RepositoryRef, ScanSession, Vulnerability};
use crate::shared::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// ScanStore port for persisting scan sessions and their vulnerabilities
///
/// The storage schema belongs to the implementation. Failures should be
/// raised as `ScanError::Persistence` so the controller can tell hard and
/// best-effort writes apart.
#[async_trait]
pub trait ScanStore: Send + Sync {
    /// Returns the id of the stored repository, creating it on first sight
    async fn upsert_repository(&self, repository: &RepositoryRef) -> Result<Uuid>;

    /// Persists the initial session row
    async fn create_session(&self, session: &ScanSession) -> Result<()>;

    async fn save_vulnerabilities(&self, scan_id: Uuid, vulnerabilities: &[Vulnerability]) -> Result<()>;

    /// Persists the final state of a completed session
    async fn complete_session(&self, session: &ScanSession) -> Result<()>;

    /// Persists the final state of a failed session
    async fn fail_session(&self, session: &ScanSession) -> Result<()>;

    /// Records when the repository was last scanned
    async fn touch_repository(&self, repository_id: Uuid, scanned_at: DateTime<Utc>) -> Result<()>;
}
