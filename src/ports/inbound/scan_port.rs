use crate::application::dto::ScanRequest;
use crate::scanning::domain::ScanResult;
use crate::shared::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// ScanRepositoryPort - Inbound port for the scan use case
///
/// This port defines the interface that driving adapters (CLI, an HTTP
/// service) use to trigger a scan. It represents the engine's public API.
#[async_trait]
pub trait ScanRepositoryPort: Send + Sync {
    /// Runs one scan to completion.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The request is invalid (`ScanError::InvalidInput`, no session created)
    /// - Persisting the repository or the session fails (`ScanError::Persistence`)
    /// - `cancel` fires before the scan completes (`ScanError::Cancelled`)
    ///
    /// Degraded detection sources are not errors; see `ScanResult::degraded_sources`.
    async fn scan(&self, request: ScanRequest, cancel: CancellationToken) -> Result<ScanResult>;
}
