use super::settings::{with_timeout, ScanSettings};
use crate::ports::outbound::{SourceHost, TreeEntry};
use crate::scanning::domain::RepositoryRef;
use crate::shared::error::ScanError;
use crate::shared::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Semaphore;

const SERVICE: &str = "source-host";

/// SourceHost decorator holding every call of one scan to a shared permit pool
///
/// The dependency and source branches fetch concurrently; routing them through
/// one `ThrottledSourceHost` keeps the combined in-flight requests at or below
/// `max_concurrency`. The request timeout starts once a permit is held, so
/// queueing behind other calls never counts against it.
pub struct ThrottledSourceHost<'a, H> {
    inner: &'a H,
    permits: Semaphore,
    request_timeout: Duration,
}

impl<'a, H: SourceHost> ThrottledSourceHost<'a, H> {
    pub fn new(inner: &'a H, settings: &ScanSettings) -> Self {
        Self {
            inner,
            permits: Semaphore::new(settings.max_concurrency.max(1)),
            request_timeout: settings.request_timeout,
        }
    }

    async fn acquire(&self) -> Result<tokio::sync::SemaphorePermit<'_>> {
        self.permits
            .acquire()
            .await
            .map_err(|_| ScanError::upstream(SERVICE, "request pool closed").into())
    }
}

#[async_trait]
impl<'a, H: SourceHost> SourceHost for ThrottledSourceHost<'a, H> {
    fn ensure_supported(&self, repo: &RepositoryRef) -> Result<()> {
        self.inner.ensure_supported(repo)
    }

    async fn fetch_file(&self, repo: &RepositoryRef, path: &str) -> Result<Option<String>> {
        let _permit = self.acquire().await?;
        with_timeout(SERVICE, self.request_timeout, self.inner.fetch_file(repo, path)).await
    }

    async fn fetch_tree(&self, repo: &RepositoryRef) -> Result<Vec<TreeEntry>> {
        let _permit = self.acquire().await?;
        with_timeout(SERVICE, self.request_timeout, self.inner.fetch_tree(repo)).await
    }
}
